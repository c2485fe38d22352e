use crate::errors::{AppError, AppResult};
use crate::store;
use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const IMAGES_DIR: &str = "images";
pub const ORIGINALS_DIR: &str = "originals";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSlot {
    Thumbnail,
    Banner,
    IconSquare,
    IconCircle,
    PosterLandscape,
    PosterPortrait,
}

impl ImageSlot {
    pub const ALL: [ImageSlot; 6] = [
        ImageSlot::Thumbnail,
        ImageSlot::Banner,
        ImageSlot::IconSquare,
        ImageSlot::IconCircle,
        ImageSlot::PosterLandscape,
        ImageSlot::PosterPortrait,
    ];

    pub fn json_key(self) -> &'static str {
        match self {
            ImageSlot::Thumbnail => "thumbnail",
            ImageSlot::Banner => "banner",
            ImageSlot::IconSquare => "iconSquare",
            ImageSlot::IconCircle => "iconCircle",
            ImageSlot::PosterLandscape => "posterLandscape",
            ImageSlot::PosterPortrait => "posterPortrait",
        }
    }

    pub fn canonical_file_name(self) -> &'static str {
        match self {
            ImageSlot::Thumbnail => "thumbnail.png",
            ImageSlot::Banner => "banner.png",
            ImageSlot::IconSquare => "icon-square.png",
            ImageSlot::IconCircle => "icon-circle.png",
            ImageSlot::PosterLandscape => "poster-landscape.png",
            ImageSlot::PosterPortrait => "poster-portrait.png",
        }
    }

    pub fn original_file_name(self) -> &'static str {
        match self {
            ImageSlot::Thumbnail => "thumbnail-original.png",
            ImageSlot::Banner => "banner-original.png",
            ImageSlot::IconSquare => "icon-square-original.png",
            ImageSlot::IconCircle => "icon-circle-original.png",
            ImageSlot::PosterLandscape => "poster-landscape-original.png",
            ImageSlot::PosterPortrait => "poster-portrait-original.png",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImageSlot::Thumbnail => "Thumbnail",
            ImageSlot::Banner => "Banner",
            ImageSlot::IconSquare => "Icon (Square)",
            ImageSlot::IconCircle => "Icon (Circle)",
            ImageSlot::PosterLandscape => "Poster (Landscape)",
            ImageSlot::PosterPortrait => "Poster (Portrait)",
        }
    }
}

pub fn canonical_path(dir: &Path, slot: ImageSlot) -> PathBuf {
    dir.join(IMAGES_DIR).join(slot.canonical_file_name())
}

pub fn original_path(dir: &Path, slot: ImageSlot) -> PathBuf {
    dir.join(IMAGES_DIR)
        .join(ORIGINALS_DIR)
        .join(slot.original_file_name())
}

// Owns only the images object and updatedAt; every other top-level key stays
// untouched. Returns the thumbnail slot's file name so callers can mirror it
// into the legacy top-level field.
pub fn reconcile(
    dir: &Path,
    sets: &[(ImageSlot, String)],
    removes: &[ImageSlot],
) -> AppResult<Option<String>> {
    let mut document = read_document(&store::sidecar_path(dir));

    let mut images = match document.remove("images") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    };
    images.insert("directory".to_string(), Value::String(IMAGES_DIR.to_string()));
    for slot in removes {
        images.remove(slot.json_key());
    }
    for (slot, file_name) in sets {
        images.insert(slot.json_key().to_string(), Value::String(file_name.clone()));
    }

    let thumbnail = images
        .get(ImageSlot::Thumbnail.json_key())
        .and_then(Value::as_str)
        .map(ToString::to_string);

    document.insert("images".to_string(), Value::Object(images));
    document.insert(
        "updatedAt".to_string(),
        Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::AutoSi, true)),
    );

    fs::create_dir_all(dir).map_err(|error| AppError::Write(error.to_string()))?;
    store::write_document_atomic(&Value::Object(document), dir)?;
    Ok(thumbnail)
}

// Naming convention only; the image bytes are not touched.
pub fn stage_thumbnail(src: &Path, dir: &Path) -> AppResult<String> {
    let file_name = match src.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() => format!("thumbnail.{}", ext),
        _ => "thumbnail".to_string(),
    };
    fs::create_dir_all(dir).map_err(|error| AppError::Write(error.to_string()))?;
    let dest = dir.join(&file_name);
    if dest.exists() {
        fs::remove_file(&dest).map_err(|error| AppError::Write(error.to_string()))?;
    }
    fs::copy(src, &dest).map_err(|error| AppError::Write(error.to_string()))?;
    Ok(file_name)
}

fn read_document(path: &Path) -> Map<String, Value> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => return Map::new(),
    };
    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

use crate::errors::{AppError, AppResult};
use crate::models::{MainStatus, Project, Reviewed};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

pub const SIDECAR_FILE: &str = "_project.json";

pub fn sidecar_path(dir: &Path) -> PathBuf {
    dir.join(SIDECAR_FILE)
}

pub fn has_sidecar(dir: &Path) -> bool {
    sidecar_path(dir).is_file()
}

pub fn load(dir: &Path) -> AppResult<Option<Project>> {
    let path = sidecar_path(dir);
    if !path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&path).map_err(|error| AppError::Access(error.to_string()))?;
    let project = serde_json::from_slice(&bytes)
        .map_err(|error| AppError::Malformed(format!("{}: {}", path.to_string_lossy(), error)))?;
    Ok(Some(project))
}

pub fn validate(project: &Project) -> AppResult<()> {
    if project.visibility.eq_ignore_ascii_case("public") && project.summary.trim().is_empty() {
        return Err(AppError::Validation(
            "public visibility requires a non-empty summary".to_string(),
        ));
    }
    Ok(())
}

// Top-level keys the record does not own are spliced back from the existing
// file. Returns the record as written.
pub fn save(project: &Project, dir: &Path) -> AppResult<Project> {
    validate(project)?;

    let now = Utc::now();
    let mut stamped = project.clone();
    stamped.updated_at = now;
    stamped.reviewed = if stamped.status == MainStatus::Idea {
        Reviewed::No
    } else {
        Reviewed::At(now)
    };

    fs::create_dir_all(dir).map_err(|error| AppError::Write(error.to_string()))?;

    let mut document = match serde_json::to_value(&stamped)? {
        Value::Object(map) => map,
        other => {
            return Err(AppError::Internal(format!(
                "project encoded as non-object: {}",
                other
            )))
        }
    };
    merge_foreign_keys(&mut document, dir);
    write_document_atomic(&Value::Object(document), dir)?;

    Ok(stamped)
}

fn merge_foreign_keys(document: &mut Map<String, Value>, dir: &Path) {
    let path = sidecar_path(dir);
    if !path.exists() {
        return;
    }
    let existing = fs::read(&path)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());
    let existing = match existing {
        Some(Value::Object(map)) => map,
        _ => {
            tracing::warn!(
                path = %path.to_string_lossy(),
                "existing project file unreadable; foreign keys not preserved"
            );
            return;
        }
    };
    for (key, value) in existing {
        if !Project::FIELD_NAMES.contains(&key.as_str()) {
            document.insert(key, value);
        }
    }
}

// Same-directory temp file then rename; readers never see a partial document.
pub(crate) fn write_document_atomic(document: &Value, dir: &Path) -> AppResult<()> {
    let path = sidecar_path(dir);
    let staging = dir.join(format!("{}.tmp", SIDECAR_FILE));
    let bytes = serde_json::to_vec_pretty(document)?;
    fs::write(&staging, &bytes).map_err(|error| AppError::Write(error.to_string()))?;
    fs::rename(&staging, &path).map_err(|error| {
        let _ = fs::remove_file(&staging);
        AppError::Write(error.to_string())
    })?;
    Ok(())
}

// An explicit `reviewed: false` flags the project, a parsable timestamp
// clears it, anything else falls back to the status.
pub fn needs_review(dir: &Path) -> bool {
    let document = match read_raw(dir) {
        Some(document) => document,
        None => return false,
    };
    match document.get("reviewed") {
        Some(Value::Bool(false)) => true,
        Some(Value::String(raw)) if DateTime::parse_from_rfc3339(raw).is_ok() => false,
        _ => matches!(
            document.get("status"),
            Some(Value::String(status)) if status == MainStatus::Idea.as_str()
        ),
    }
}

pub fn read_status(dir: &Path) -> Option<String> {
    read_raw(dir)?
        .get("status")
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

pub fn read_visibility(dir: &Path) -> Option<String> {
    read_raw(dir)?
        .get("visibility")
        .and_then(Value::as_str)
        .map(str::to_lowercase)
}

fn read_raw(dir: &Path) -> Option<Map<String, Value>> {
    let bytes = fs::read(sidecar_path(dir)).ok()?;
    match serde_json::from_slice::<Value>(&bytes).ok()? {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

pub fn create_project_folder(domain_dir: &Path, name: &str) -> AppResult<PathBuf> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(
            "project folder name cannot be empty".to_string(),
        ));
    }
    let dir = domain_dir.join(trimmed);
    fs::create_dir_all(&dir).map_err(|error| AppError::Write(error.to_string()))?;
    Ok(dir)
}

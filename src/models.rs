use crate::rules;
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MainStatus {
    Idea,
    InProgress,
    Done,
    Archived,
}

impl MainStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idea => "idea",
            Self::InProgress => "in_progress",
            Self::Done => "done",
            Self::Archived => "archived",
        }
    }
}

// Wire shape is a boolean or an ISO-8601 string. A literal `true` is accepted
// on decode but never produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reviewed {
    No,
    At(DateTime<Utc>),
}

impl Serialize for Reviewed {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::No => serializer.serialize_bool(false),
            Self::At(at) => {
                serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
        }
    }
}

impl<'de> Deserialize<'de> for Reviewed {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::String(raw) => match DateTime::parse_from_rfc3339(&raw) {
                Ok(parsed) => Self::At(parsed.with_timezone(&Utc)),
                Err(_) => Self::No,
            },
            _ => Self::No,
        })
    }
}

// Encodes as a bare string at exactly one value and as an array otherwise;
// downstream tooling depends on that collapsed shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TechMedium {
    pub values: Vec<String>,
}

impl From<Vec<String>> for TechMedium {
    fn from(values: Vec<String>) -> Self {
        Self { values }
    }
}

impl Serialize for TechMedium {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.values.len() == 1 {
            serializer.serialize_str(&self.values[0])
        } else {
            self.values.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for TechMedium {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        match value {
            serde_json::Value::String(single) => Ok(Self {
                values: if single.is_empty() { Vec::new() } else { vec![single] },
            }),
            other => {
                let values: Vec<String> = serde_json::from_value(other).map_err(D::Error::custom)?;
                Ok(Self { values })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    pub id: Uuid,
    pub r#type: String,
    pub label: String,
    pub url: String,
}

impl ResourceLink {
    pub fn new(r#type: &str, label: &str, url: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            r#type: r#type.to_string(),
            label: label.to_string(),
            url: url.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub domain: String,
    pub title: String,
    pub subtitle: String,
    pub summary: String,
    pub visibility: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_category: Option<String>,
    pub tech_medium: TechMedium,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creative_genres: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expo_topic: Option<String>,
    pub status: MainStatus,
    #[serde(rename = "subStatus", skip_serializing_if = "Option::is_none")]
    pub sub_status: Option<String>,
    pub tags: Vec<String>,
    pub resources: Vec<ResourceLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
    pub reviewed: Reviewed,
}

impl Project {
    // Any document key not listed here is foreign and must survive saves.
    pub const FIELD_NAMES: &'static [&'static str] = &[
        "id",
        "domain",
        "title",
        "subtitle",
        "summary",
        "visibility",
        "category",
        "tech_category",
        "tech_medium",
        "creative_genres",
        "expo_topic",
        "status",
        "subStatus",
        "tags",
        "resources",
        "thumbnail",
        "createdAt",
        "updatedAt",
        "reviewed",
    ];

    pub fn empty() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            domain: String::new(),
            title: String::new(),
            subtitle: String::new(),
            summary: String::new(),
            visibility: "private".to_string(),
            category: None,
            tech_category: None,
            tech_medium: TechMedium::default(),
            creative_genres: None,
            expo_topic: None,
            status: MainStatus::Idea,
            sub_status: None,
            tags: Vec::new(),
            resources: Vec::new(),
            thumbnail: None,
            created_at: now,
            updated_at: now,
            reviewed: Reviewed::No,
        }
    }

    pub fn seed(domain: &str, folder: &str, is_idea: bool) -> Self {
        let mut project = Self::empty();
        project.id = folder.to_lowercase().replace(' ', "_");
        project.domain = domain.to_string();
        project.title = folder.to_string();
        project.status = if is_idea { MainStatus::Idea } else { MainStatus::InProgress };
        project
    }
}

// A ref does not imply the folder contains a sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProjectRef {
    pub parent: PathBuf,
    pub name: String,
}

impl ProjectRef {
    pub fn new(parent: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            parent: parent.into(),
            name: name.into(),
        }
    }

    pub fn dir(&self) -> PathBuf {
        self.parent.join(&self.name)
    }
}

impl Ord for ProjectRef {
    fn cmp(&self, other: &Self) -> Ordering {
        rules::compare_names(&self.name, &other.name).then_with(|| self.parent.cmp(&other.parent))
    }
}

impl PartialOrd for ProjectRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub resource_types: Vec<String>,
    pub visibility: BTreeMap<String, String>,
    pub domain_categories: BTreeMap<String, Vec<String>>,
    pub tech_mediums: Vec<String>,
    pub hardware_mediums: Vec<String>,
    pub script_mediums: Vec<String>,
    pub game_mediums: Vec<String>,
    pub creative_genres: Vec<String>,
    pub expository_topics: Vec<String>,
    pub creative_story_mediums: Vec<String>,
    pub creative_article_mediums: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resource_types: string_vec(&[
                "github", "gitlab", "overleaf", "gdoc", "gslide", "pdf", "markdown", "video",
                "audio", "image", "dataset", "website", "blog",
            ]),
            visibility: [
                ("private", "Private"),
                ("unlisted", "Unlisted"),
                ("public", "Public"),
                ("restricted", "Restricted"),
            ]
            .iter()
            .map(|(key, label)| (key.to_string(), label.to_string()))
            .collect(),
            domain_categories: [
                ("Technology", vec!["Software", "Hardware", "System"]),
                ("Creative", vec!["Story", "Game", "Article", "Other"]),
                (
                    "Expository",
                    vec!["Article", "Essay", "Research", "Report", "Tutorial", "WhitePaper"],
                ),
            ]
            .into_iter()
            .map(|(domain, categories)| (domain.to_string(), string_vec(&categories)))
            .collect(),
            tech_mediums: string_vec(&[
                "Mobile", "Desktop", "Web", "CLI", "API", "Module", "Library", "AR", "VR",
            ]),
            hardware_mediums: string_vec(&[
                "Microcontroller",
                "SingleBoardComputer",
                "FPGA",
                "PCB",
                "Sensor",
                "Actuator",
                "Robotics",
                "Wearable",
                "IoTDevice",
                "EmbeddedAppliance",
            ]),
            script_mediums: string_vec(&[
                "TV", "Movie", "Stage", "Podcast", "Radio", "Animation", "WebSeries", "AudioDrama",
            ]),
            game_mediums: string_vec(&[
                "Mobile", "Web", "Desktop", "Board", "AR", "VR", "Card", "Console",
            ]),
            creative_genres: string_vec(&[
                "Comedy",
                "Horror",
                "Drama",
                "SciFi",
                "Fantasy",
                "Thriller",
                "Romance",
                "Mystery",
                "Nonfiction",
                "Action",
                "Adventure",
                "Educational",
                "Informative",
                "Other",
            ]),
            expository_topics: string_vec(&[
                "Biology",
                "Mathematics",
                "Physics",
                "Chemistry",
                "ComputerScience",
                "Engineering",
                "Economics",
                "History",
                "Philosophy",
                "Psychology",
                "Sociology",
                "PoliticalScience",
                "Education",
                "Law",
                "Medicine",
                "EnvironmentalScience",
                "DataScience",
                "Art",
                "Literature",
            ]),
            creative_story_mediums: string_vec(&[
                "Tiny", "Short", "Novel", "Stage", "TV", "Movie", "Podcast", "Radio", "Web Series",
                "Other",
            ]),
            creative_article_mediums: string_vec(&[
                "Blog", "Overleaf", "Newsletter", "Magazine", "Documentation", "Other",
            ]),
        }
    }
}

fn string_vec(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| item.to_string()).collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub root_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootGrant {
    pub token: String,
    pub path: String,
    pub granted_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct BulkSaveReport {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, crate::errors::AppError)>,
}

impl BulkSaveReport {
    pub fn failed_folders(&self) -> Vec<&Path> {
        self.failed.iter().map(|(folder, _)| folder.as_path()).collect()
    }
}

static SENTENCE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]*[.!?]").expect("valid regex"));

// Trailing text without a terminator counts as one sentence.
pub fn clamp_sentences(text: &str, max: usize) -> String {
    let mut sentences: Vec<String> = Vec::new();
    let mut consumed = 0;
    for found in SENTENCE_RE.find_iter(text) {
        let sentence = found.as_str().trim();
        if !sentence.is_empty() {
            sentences.push(sentence.to_string());
        }
        consumed = found.end();
        if sentences.len() >= max {
            break;
        }
    }
    if sentences.len() < max {
        let tail = text[consumed..].trim();
        if !tail.is_empty() {
            sentences.push(tail.to_string());
        }
    }
    sentences.join(" ")
}

use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::scanner;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

// Every mutation persists the full sorted set through the state store.
pub struct TagRegistry {
    db: Arc<Database>,
    tags: Mutex<HashSet<String>>,
}

impl TagRegistry {
    pub fn new(db: Arc<Database>) -> AppResult<Self> {
        let persisted = db.load_tags()?;
        Ok(Self {
            db,
            tags: Mutex::new(persisted.into_iter().collect()),
        })
    }

    pub fn register(&self, tag: &str) -> AppResult<()> {
        let trimmed = tag.trim();
        if trimmed.is_empty() {
            return Ok(());
        }
        let snapshot = {
            let mut tags = self
                .tags
                .lock()
                .map_err(|_| AppError::Internal("tag registry mutex poisoned".to_string()))?;
            tags.insert(trimmed.to_string());
            sorted_snapshot(&tags)
        };
        self.db.replace_tags(&snapshot)
    }

    pub fn all(&self) -> AppResult<Vec<String>> {
        let tags = self
            .tags
            .lock()
            .map_err(|_| AppError::Internal("tag registry mutex poisoned".to_string()))?;
        Ok(sorted_snapshot(&tags))
    }

    // Overlapping refreshes are safe: the union is commutative and each
    // completion persists a superset of what it read.
    pub async fn refresh(&self, scan_root: PathBuf) -> AppResult<Vec<String>> {
        let harvested = tokio::task::spawn_blocking(move || scanner::harvest_tags(&scan_root))
            .await
            .map_err(|error| AppError::Internal(error.to_string()))?;
        let persisted = self.db.load_tags()?;

        let snapshot = {
            let mut tags = self
                .tags
                .lock()
                .map_err(|_| AppError::Internal("tag registry mutex poisoned".to_string()))?;
            tags.extend(persisted);
            tags.extend(harvested);
            sorted_snapshot(&tags)
        };
        self.db.replace_tags(&snapshot)?;
        Ok(snapshot)
    }
}

fn sorted_snapshot(tags: &HashSet<String>) -> Vec<String> {
    let mut sorted: Vec<String> = tags.iter().cloned().collect();
    sorted.sort();
    sorted
}

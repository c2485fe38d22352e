use crate::errors::{AppError, AppResult};
use crate::models::{BulkSaveReport, Project};
use crate::store;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
pub struct SessionState {
    baselines: HashMap<PathBuf, Project>,
    edited: HashMap<PathBuf, Project>,
    dirty: HashSet<PathBuf>,
}

impl SessionState {
    // A pending edit wins over the fresh load.
    pub fn open(&mut self, dir: &Path, loaded: Project) -> Project {
        let key = folder_key(dir);
        if let Some(edited) = self.edited.get(&key) {
            return edited.clone();
        }
        self.baselines.insert(key, loaded.clone());
        loaded
    }

    pub fn edit(&mut self, dir: &Path, record: Project) {
        let key = folder_key(dir);
        let diverged = self
            .baselines
            .get(&key)
            .map(|baseline| *baseline != record)
            .unwrap_or(true);
        if diverged {
            self.edited.insert(key.clone(), record);
            self.dirty.insert(key);
        } else {
            self.edited.remove(&key);
            self.dirty.remove(&key);
        }
    }

    pub fn edited_record(&self, dir: &Path) -> Option<Project> {
        self.edited.get(&folder_key(dir)).cloned()
    }

    pub fn current_record(&self, dir: &Path) -> Option<Project> {
        let key = folder_key(dir);
        self.edited
            .get(&key)
            .or_else(|| self.baselines.get(&key))
            .cloned()
    }

    pub fn is_dirty(&self, dir: &Path) -> bool {
        self.dirty.contains(&folder_key(dir))
    }

    pub fn dirty_folders(&self) -> Vec<PathBuf> {
        let mut folders: Vec<PathBuf> = self.dirty.iter().cloned().collect();
        folders.sort();
        folders
    }

    // The baseline stays registered so a reopened editor starts from the last
    // saved state.
    pub fn discard(&mut self, dir: &Path) {
        let key = folder_key(dir);
        self.edited.remove(&key);
        self.dirty.remove(&key);
    }

    pub fn mark_saved(&mut self, dir: &Path, saved: Project) {
        let key = folder_key(dir);
        self.edited.remove(&key);
        self.dirty.remove(&key);
        self.baselines.insert(key, saved);
    }

    pub fn save_all_edited(&mut self) -> BulkSaveReport {
        let mut snapshot: Vec<(PathBuf, Project)> = self
            .edited
            .iter()
            .map(|(folder, record)| (folder.clone(), record.clone()))
            .collect();
        snapshot.sort_by(|a, b| a.0.cmp(&b.0));

        let mut report = BulkSaveReport::default();
        for (folder, record) in snapshot {
            match store::save(&record, &folder) {
                Ok(saved) => {
                    self.mark_saved(&folder, saved);
                    report.saved.push(folder);
                }
                Err(error) => {
                    tracing::warn!(
                        path = %folder.to_string_lossy(),
                        error = %error,
                        "bulk save failed; project stays dirty"
                    );
                    report.failed.push((folder, error));
                }
            }
        }
        report
    }

    pub fn save(&mut self, dir: &Path) -> AppResult<Project> {
        let key = folder_key(dir);
        let record = self
            .edited
            .get(&key)
            .or_else(|| self.baselines.get(&key))
            .cloned()
            .ok_or_else(|| {
                AppError::NotFound(format!("no open record for {}", dir.display()))
            })?;
        let saved = store::save(&record, dir)?;
        self.mark_saved(dir, saved.clone());
        Ok(saved)
    }
}

// The key must not change when a save creates the folder, so components that
// do not exist yet resolve through the nearest existing ancestor.
fn folder_key(dir: &Path) -> PathBuf {
    if let Ok(canonical) = fs::canonicalize(dir) {
        return canonical;
    }
    match (dir.parent(), dir.file_name()) {
        (Some(parent), Some(leaf)) => folder_key(parent).join(leaf),
        _ => dir.to_path_buf(),
    }
}

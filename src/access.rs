use crate::db::Database;
use crate::errors::{AppError, AppResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// Readability is checked at grant time and again at every resolve.
pub struct AccessBroker {
    db: Arc<Database>,
}

impl AccessBroker {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn grant_access(&self, path: &Path) -> AppResult<String> {
        verify_readable(path)?;
        let grant = self.db.insert_root_grant(&path.to_string_lossy())?;
        Ok(grant.token)
    }

    pub fn resolve(&self, token: &str) -> AppResult<PathBuf> {
        let grant = self
            .db
            .resolve_root_grant(token)?
            .ok_or_else(|| AppError::Access(format!("unknown or revoked grant {}", token)))?;
        let path = PathBuf::from(grant.path);
        verify_readable(&path)?;
        Ok(path)
    }

    pub fn revoke(&self, token: &str) -> AppResult<bool> {
        self.db.revoke_root_grant(token)
    }

    // The scope is logical; it is released on every exit path.
    pub fn with_scope<T>(
        &self,
        token: &str,
        body: impl FnOnce(&Path) -> AppResult<T>,
    ) -> AppResult<T> {
        let root = self.resolve(token)?;
        body(&root)
    }
}

fn verify_readable(path: &Path) -> AppResult<()> {
    fs::read_dir(path)
        .map(|_| ())
        .map_err(|error| AppError::Access(format!("{}: {}", path.to_string_lossy(), error)))
}

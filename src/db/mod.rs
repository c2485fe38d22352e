use crate::errors::{AppError, AppResult};
use crate::models::{AppSettings, RootGrant};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

const SCHEMA_SQL: &str = include_str!("schema.sql");

// Project data never lands here; the portfolio folders stay the source of
// truth for everything except settings, grants, and the tag vocabulary.
#[derive(Debug)]
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(path: &Path) -> AppResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|error| AppError::Write(error.to_string()))?;
        }
        let conn = Connection::open(path).map_err(AppError::from)?;
        conn.execute_batch(SCHEMA_SQL).map_err(AppError::from)?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.ensure_default_settings()?;
        Ok(db)
    }

    // ─── Settings ────────────────────────────────────────────────────────────

    pub fn get_settings(&self) -> AppResult<AppSettings> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let raw = conn
            .query_row(
                "SELECT value_json FROM settings WHERE key = 'app'",
                [],
                |row| row.get::<_, String>(0),
            )
            .optional()?;

        match raw {
            Some(raw) => Ok(serde_json::from_str::<AppSettings>(&raw).unwrap_or_default()),
            None => Ok(AppSettings::default()),
        }
    }

    pub fn update_settings(&self, update: serde_json::Value) -> AppResult<AppSettings> {
        let current = self.get_settings()?;
        let mut merged = serde_json::to_value(current)?;
        merge_json(&mut merged, update);
        let settings: AppSettings = serde_json::from_value(merged)?;

        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO settings (key, value_json, updated_at)
             VALUES ('app', ?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json, updated_at = excluded.updated_at",
            params![serde_json::to_string(&settings)?, Utc::now().to_rfc3339()],
        )?;

        Ok(settings)
    }

    fn ensure_default_settings(&self) -> AppResult<()> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let count: i64 = conn.query_row("SELECT COUNT(1) FROM settings WHERE key = 'app'", [], |row| row.get(0))?;
        if count == 0 {
            conn.execute(
                "INSERT INTO settings (key, value_json, updated_at) VALUES ('app', ?1, ?2)",
                params![
                    serde_json::to_string(&AppSettings::default())?,
                    Utc::now().to_rfc3339()
                ],
            )?;
        }
        Ok(())
    }

    // ─── Root grants ─────────────────────────────────────────────────────────

    pub fn insert_root_grant(&self, path: &str) -> AppResult<RootGrant> {
        let now = Utc::now();
        let token = Uuid::new_v4().to_string();
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.execute(
            "INSERT INTO root_grants (token, path, granted_at, revoked_at)
             VALUES (?1, ?2, ?3, NULL)",
            params![token, path, now.to_rfc3339()],
        )?;
        Ok(RootGrant {
            token,
            path: path.to_string(),
            granted_at: now,
            revoked_at: None,
        })
    }

    pub fn resolve_root_grant(&self, token: &str) -> AppResult<Option<RootGrant>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        conn.query_row(
            "SELECT token, path, granted_at, revoked_at
             FROM root_grants WHERE token = ?1 AND revoked_at IS NULL",
            [token],
            |row| {
                Ok(RootGrant {
                    token: row.get(0)?,
                    path: row.get(1)?,
                    granted_at: parse_time(&row.get::<_, String>(2)?)?,
                    revoked_at: row
                        .get::<_, Option<String>>(3)?
                        .map(|raw| parse_time(&raw))
                        .transpose()?,
                })
            },
        )
        .optional()
        .map_err(AppError::from)
    }

    pub fn revoke_root_grant(&self, token: &str) -> AppResult<bool> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let changed = conn.execute(
            "UPDATE root_grants SET revoked_at = ?1 WHERE token = ?2 AND revoked_at IS NULL",
            params![Utc::now().to_rfc3339(), token],
        )?;
        Ok(changed > 0)
    }

    pub fn list_root_grants(&self) -> AppResult<Vec<RootGrant>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let mut stmt = conn.prepare(
            "SELECT token, path, granted_at, revoked_at
             FROM root_grants ORDER BY granted_at DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RootGrant {
                    token: row.get(0)?,
                    path: row.get(1)?,
                    granted_at: parse_time(&row.get::<_, String>(2)?)?,
                    revoked_at: row
                        .get::<_, Option<String>>(3)?
                        .map(|raw| parse_time(&raw))
                        .transpose()?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ─── Known tags ──────────────────────────────────────────────────────────

    pub fn load_tags(&self) -> AppResult<Vec<String>> {
        let conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let mut stmt = conn.prepare("SELECT tag FROM known_tags ORDER BY tag")?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn replace_tags(&self, tags: &[String]) -> AppResult<()> {
        let mut conn = self.conn.lock().map_err(|_| AppError::Internal("database mutex poisoned".to_string()))?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM known_tags", [])?;
        let now = Utc::now().to_rfc3339();
        for tag in tags {
            tx.execute(
                "INSERT OR IGNORE INTO known_tags (tag, registered_at) VALUES (?1, ?2)",
                params![tag, now],
            )?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn parse_time(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|error| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, error.to_string())),
            )
        })
}

fn merge_json(target: &mut serde_json::Value, update: serde_json::Value) {
    match (target, update) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(update_map)) => {
            for (key, value) in update_map {
                merge_json(target_map.entry(key).or_insert(serde_json::Value::Null), value);
            }
        }
        (target, update) => {
            *target = update;
        }
    }
}

pub mod access;
pub mod db;
pub mod errors;
pub mod images;
pub mod models;
pub mod organizer;
pub mod rules;
pub mod scanner;
pub mod session;
pub mod store;
pub mod tags;

pub use crate::errors::{AppError, AppResult};
pub use crate::images::ImageSlot;
pub use crate::models::{
    clamp_sentences, AppSettings, BulkSaveReport, Config, MainStatus, Project, ProjectRef,
    ResourceLink, Reviewed, RootGrant, TechMedium,
};
pub use crate::organizer::OrganizerCore;

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

// The guard keeps the non-blocking appender flushing for the process lifetime.
pub fn init_tracing(app_data_dir: &Path) -> AppResult<()> {
    let log_dir = app_data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| AppError::Write(error.to_string()))?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "organizer.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| AppError::Internal(error.to_string()))
}

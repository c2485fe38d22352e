use crate::access::AccessBroker;
use crate::db::Database;
use crate::errors::{AppError, AppResult};
use crate::images::{self, ImageSlot};
use crate::models::{clamp_sentences, BulkSaveReport, Config, Project, ProjectRef};
use crate::rules;
use crate::scanner;
use crate::session::SessionState;
use crate::store;
use crate::tags::TagRegistry;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub struct OrganizerCore {
    db: Arc<Database>,
    access: AccessBroker,
    tags: TagRegistry,
    session: Mutex<SessionState>,
    config: Config,
    root: Mutex<Option<PathBuf>>,
}

impl OrganizerCore {
    pub fn new(app_data_dir: PathBuf) -> AppResult<Arc<Self>> {
        let db_path = app_data_dir.join("state.sqlite");
        let db = Arc::new(Database::new(&db_path)?);
        let access = AccessBroker::new(db.clone());
        let tags = TagRegistry::new(db.clone())?;

        let settings = db.get_settings()?;
        let root = settings.root_token.as_deref().and_then(|token| {
            match access.resolve(token) {
                Ok(path) => Some(path),
                Err(error) => {
                    tracing::warn!(error = %error, "stored root grant no longer resolves");
                    None
                }
            }
        });

        Ok(Arc::new(Self {
            db,
            access,
            tags,
            session: Mutex::new(SessionState::default()),
            config: Config::default(),
            root: Mutex::new(root),
        }))
    }

    // ─── Root selection ──────────────────────────────────────────────────────

    // The new token is stored before the old grant is revoked.
    pub async fn choose_root(&self, path: &Path) -> AppResult<PathBuf> {
        let token = self.access.grant_access(path)?;
        let previous = self.db.get_settings()?.root_token;
        self.db.update_settings(json!({ "rootToken": token }))?;
        if let Some(previous) = previous {
            let _ = self.access.revoke(&previous);
        }

        let resolved = self.access.resolve(&token)?;
        {
            let mut root = self
                .root
                .lock()
                .map_err(|_| AppError::Internal("root mutex poisoned".to_string()))?;
            *root = Some(resolved.clone());
        }

        if let Err(error) = self.refresh_tags().await {
            tracing::warn!(error = %error, "tag refresh after root change failed");
        }
        Ok(resolved)
    }

    pub fn root_path(&self) -> Option<PathBuf> {
        self.root.lock().ok().and_then(|root| root.clone())
    }

    // ─── Listing ─────────────────────────────────────────────────────────────

    pub fn list_domains(&self) -> Vec<PathBuf> {
        let Some(root) = self.root_path() else {
            return Vec::new();
        };
        match scanner::list_domains(&root) {
            Ok(domains) => domains,
            Err(error) => {
                tracing::warn!(error = %error, "domain scan failed");
                Vec::new()
            }
        }
    }

    pub fn list_projects(&self, domain: &Path) -> Vec<String> {
        match scanner::list_projects(domain) {
            Ok(names) => names,
            Err(error) => {
                tracing::warn!(path = %domain.to_string_lossy(), error = %error, "project scan failed");
                Vec::new()
            }
        }
    }

    pub fn list_projects_including_ideas(&self, domain: &Path) -> Vec<ProjectRef> {
        match scanner::list_projects_including_ideas(domain) {
            Ok(refs) => refs,
            Err(error) => {
                tracing::warn!(path = %domain.to_string_lossy(), error = %error, "project scan failed");
                Vec::new()
            }
        }
    }

    // ─── Open / edit / save ──────────────────────────────────────────────────

    pub fn open_project(&self, domain_dir: &Path, name: &str) -> AppResult<Project> {
        self.open_project_in(domain_dir, &domain_dir.join(name))
    }

    // Pending edit wins, then the on-disk record, then a seeded draft.
    pub fn open_project_in(&self, top_domain: &Path, dir: &Path) -> AppResult<Project> {
        let loaded = match store::load(dir) {
            Ok(Some(loaded)) => loaded,
            Ok(None) => seed_for(top_domain, dir),
            Err(AppError::Malformed(message)) => {
                tracing::warn!(path = %dir.to_string_lossy(), error = %message, "sidecar malformed; seeding fresh record");
                seed_for(top_domain, dir)
            }
            Err(error) => return Err(error),
        };
        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::Internal("session mutex poisoned".to_string()))?;
        Ok(session.open(dir, loaded))
    }

    pub fn edit_project(&self, dir: &Path, record: Project) -> AppResult<()> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::Internal("session mutex poisoned".to_string()))?;
        session.edit(dir, record);
        Ok(())
    }

    pub fn is_dirty(&self, dir: &Path) -> bool {
        self.session
            .lock()
            .map(|session| session.is_dirty(dir))
            .unwrap_or(false)
    }

    pub fn dirty_folders(&self) -> Vec<PathBuf> {
        self.session
            .lock()
            .map(|session| session.dirty_folders())
            .unwrap_or_default()
    }

    pub fn discard_edits(&self, dir: &Path) {
        if let Ok(mut session) = self.session.lock() {
            session.discard(dir);
        }
    }

    pub fn save_project(&self, dir: &Path, record: Project) -> AppResult<Project> {
        let mut record = record;
        if record.visibility.eq_ignore_ascii_case("public") {
            record.summary = clamp_sentences(&record.summary, 3);
        }
        let saved = store::save(&record, dir)?;
        {
            let mut session = self
                .session
                .lock()
                .map_err(|_| AppError::Internal("session mutex poisoned".to_string()))?;
            session.mark_saved(dir, saved.clone());
        }
        for tag in &saved.tags {
            self.tags.register(tag)?;
        }
        Ok(saved)
    }

    pub fn save_all_edited(&self) -> AppResult<BulkSaveReport> {
        let mut session = self
            .session
            .lock()
            .map_err(|_| AppError::Internal("session mutex poisoned".to_string()))?;
        Ok(session.save_all_edited())
    }

    pub fn save_project_with_images(
        &self,
        dir: &Path,
        sets: &[(ImageSlot, String)],
        removes: &[ImageSlot],
    ) -> AppResult<Project> {
        let thumbnail = images::reconcile(dir, sets, removes)?;
        let mut record = {
            let session = self
                .session
                .lock()
                .map_err(|_| AppError::Internal("session mutex poisoned".to_string()))?;
            session.current_record(dir).ok_or_else(|| {
                AppError::NotFound(format!("no open record for {}", dir.display()))
            })?
        };
        // A staged legacy thumbnail survives reconciles that leave the slot alone.
        if thumbnail.is_some() || removes.contains(&ImageSlot::Thumbnail) {
            record.thumbnail = thumbnail;
        }
        self.save_project(dir, record)
    }

    // ─── Review flow ─────────────────────────────────────────────────────────

    // Walks from the start when `after` is `None` or no longer listed.
    pub fn next_unreviewed(&self, domain: &Path, after: Option<&ProjectRef>) -> Option<ProjectRef> {
        let refs = self.list_projects_including_ideas(domain);
        let start = match after {
            Some(after) => refs
                .iter()
                .position(|candidate| candidate == after)
                .map(|index| index + 1)
                .unwrap_or(0),
            None => 0,
        };
        refs[start..]
            .iter()
            .find(|candidate| store::needs_review(&candidate.dir()))
            .cloned()
    }

    pub fn needs_review(&self, dir: &Path) -> bool {
        store::needs_review(dir)
    }

    pub fn has_sidecar(&self, dir: &Path) -> bool {
        store::has_sidecar(dir)
    }

    // ─── Creation ────────────────────────────────────────────────────────────

    pub fn new_project(&self, domain_dir: &Path, name: &str) -> AppResult<Project> {
        let dir = store::create_project_folder(domain_dir, name)?;
        self.open_project_in(domain_dir, &dir)
    }

    // ─── Tags & config ───────────────────────────────────────────────────────

    pub fn register_tag(&self, tag: &str) -> AppResult<()> {
        self.tags.register(tag)
    }

    pub fn all_tags(&self) -> AppResult<Vec<String>> {
        self.tags.all()
    }

    pub async fn refresh_tags(&self) -> AppResult<Vec<String>> {
        let Some(root) = self.root_path() else {
            return self.tags.all();
        };
        self.tags.refresh(root).await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
}

fn seed_for(top_domain: &Path, dir: &Path) -> Project {
    let domain = leaf_name(top_domain);
    let folder = leaf_name(dir);
    let is_idea = dir
        .parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy() == rules::IDEAS_FOLDER)
        .unwrap_or(false);
    Project::seed(&domain, &folder, is_idea)
}

fn leaf_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

use portfolio_organizer::{rules, store, MainStatus, OrganizerCore};
use serde_json::Value;
use std::fs;
use std::path::Path;

fn leaf(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn write_sidecar(dir: &Path, contents: &str) {
    fs::create_dir_all(dir).expect("create project dir");
    fs::write(dir.join(store::SIDECAR_FILE), contents).expect("write sidecar");
}

#[tokio::test]
async fn full_editing_flow_over_a_scratch_tree() {
    let app_data = tempfile::tempdir().expect("app data dir");
    let portfolio = tempfile::tempdir().expect("portfolio root");

    let tech = portfolio.path().join("Technology");
    let creative = portfolio.path().join("Creative");
    let app_one = tech.join("AppOne");
    let sketch = tech.join(rules::IDEAS_FOLDER).join("SketchX");
    let zine = creative.join("Zine");
    write_sidecar(
        &app_one,
        r#"{
            "id": "appone",
            "domain": "Technology",
            "title": "App One",
            "subtitle": "",
            "summary": "Ships.",
            "visibility": "private",
            "tech_medium": [],
            "status": "in_progress",
            "tags": ["cli"],
            "resources": [],
            "createdAt": "2025-01-01T00:00:00Z",
            "updatedAt": "2025-01-01T00:00:00Z",
            "reviewed": "2025-01-02T00:00:00Z",
            "planning": [{"step": 1}]
        }"#,
    );
    fs::create_dir_all(&sketch).expect("create idea");
    fs::create_dir_all(&zine).expect("create project");
    fs::create_dir_all(portfolio.path().join("_archive_")).expect("create reserved");
    fs::create_dir_all(portfolio.path().join(".git")).expect("create hidden");

    let core = OrganizerCore::new(app_data.path().to_path_buf()).expect("open core");
    core.choose_root(portfolio.path()).await.expect("choose root");
    assert_eq!(core.root_path(), Some(portfolio.path().to_path_buf()));

    // Reserved and hidden folders stay out of the domain list.
    let domains: Vec<String> = core.list_domains().iter().map(|d| leaf(d)).collect();
    assert_eq!(domains, vec!["Creative", "Technology"]);

    // The root-change harvest already picked up tags from existing sidecars.
    assert_eq!(core.all_tags().expect("tags"), vec!["cli"]);

    let refs = core.list_projects_including_ideas(&tech);
    let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["AppOne", "SketchX"]);

    // Existing sidecar loads; edits flip the dirty flag; save clears it and
    // keeps foreign keys intact.
    let mut record = core.open_project_in(&tech, &app_one).expect("open AppOne");
    assert_eq!(record.title, "App One");
    assert!(!core.is_dirty(&app_one));
    record.subtitle = "Terminal companion".to_string();
    core.edit_project(&app_one, record.clone()).expect("edit");
    assert!(core.is_dirty(&app_one));
    core.save_project(&app_one, record).expect("save AppOne");
    assert!(!core.is_dirty(&app_one));

    let raw: Value = serde_json::from_slice(
        &fs::read(app_one.join(store::SIDECAR_FILE)).expect("read sidecar"),
    )
    .expect("parse sidecar");
    assert_eq!(raw["subtitle"], "Terminal companion");
    assert_eq!(raw["planning"], serde_json::json!([{"step": 1}]));
    assert_ne!(raw["reviewed"], "2025-01-02T00:00:00Z");

    // A bare idea folder seeds as an idea draft; a bare domain child as an
    // active draft.
    let mut idea = core.open_project_in(&tech, &sketch).expect("open SketchX");
    assert_eq!(idea.status, MainStatus::Idea);
    assert_eq!(idea.domain, "Technology");
    idea.summary = "Rough shape of a drawing tool.".to_string();
    core.edit_project(&sketch, idea).expect("edit idea");

    let mut draft = core.open_project_in(&creative, &zine).expect("open Zine");
    assert_eq!(draft.status, MainStatus::InProgress);
    draft.subtitle = "Quarterly".to_string();
    core.edit_project(&zine, draft).expect("edit Zine");
    assert_eq!(core.dirty_folders().len(), 2);

    // Break Zine's folder so its save fails; the bulk save must keep going
    // and leave only Zine dirty.
    fs::remove_dir_all(&zine).expect("remove Zine");
    fs::write(&zine, "blocking file").expect("write blocker");

    let report = core.save_all_edited().expect("bulk save");
    assert_eq!(report.saved.len(), 1);
    assert_eq!(report.failed.len(), 1);
    assert!(!core.is_dirty(&sketch));
    assert!(core.is_dirty(&zine));

    // The saved idea is flagged for review; the saved active project is not.
    assert!(core.needs_review(&sketch));
    assert!(!core.needs_review(&app_one));
    let flagged = core.next_unreviewed(&tech, None).expect("one flagged ref");
    assert_eq!(flagged.name, "SketchX");
    assert!(core.next_unreviewed(&tech, Some(&flagged)).is_none());

    // Tag registration and refresh stay unioned.
    core.register_tag("handmade").expect("register");
    let tags = core.refresh_tags().await.expect("refresh");
    assert_eq!(tags, vec!["cli", "handmade"]);
}

#[tokio::test]
async fn seeded_drafts_only_exist_on_disk_after_a_save() {
    let app_data = tempfile::tempdir().expect("app data dir");
    let portfolio = tempfile::tempdir().expect("portfolio root");
    let tech = portfolio.path().join("Technology");
    fs::create_dir_all(&tech).expect("create domain");

    let core = OrganizerCore::new(app_data.path().to_path_buf()).expect("open core");
    core.choose_root(portfolio.path()).await.expect("choose root");

    let seeded = core.new_project(&tech, "Fresh App").expect("new project");
    let dir = tech.join("Fresh App");
    assert!(dir.is_dir());
    assert!(!core.has_sidecar(&dir));
    assert_eq!(seeded.id, "fresh_app");

    core.save_project(&dir, seeded).expect("save");
    assert!(core.has_sidecar(&dir));
    let reloaded = core.open_project_in(&tech, &dir).expect("reopen");
    assert_eq!(reloaded.id, "fresh_app");
    assert_eq!(reloaded.title, "Fresh App");
}

#[test]
fn tracing_bootstrap_creates_the_log_dir() {
    let app_data = tempfile::tempdir().expect("app data dir");
    portfolio_organizer::init_tracing(app_data.path()).expect("init tracing");
    assert!(app_data.path().join("logs").is_dir());
}

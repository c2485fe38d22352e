use crate::errors::{AppError, AppResult};
use crate::models::ProjectRef;
use crate::rules;
use crate::store;
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub fn list_domains(root: &Path) -> AppResult<Vec<PathBuf>> {
    let entries = fs::read_dir(root).map_err(|error| AppError::Access(error.to_string()))?;
    let mut domains = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| AppError::Access(error.to_string()))?;
        let name = entry_name(&entry);
        if is_hidden(&name) || !rules::is_domain_folder(&name) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            domains.push(path);
        }
    }
    domains.sort_by(|a, b| rules::compare_names(&leaf_name(a), &leaf_name(b)));
    Ok(domains)
}

pub fn list_projects(domain: &Path) -> AppResult<Vec<String>> {
    let entries = fs::read_dir(domain).map_err(|error| AppError::Access(error.to_string()))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| AppError::Access(error.to_string()))?;
        let name = entry_name(&entry);
        if is_hidden(&name) || !entry.path().is_dir() {
            continue;
        }
        names.push(name);
    }
    names.sort_by(|a, b| rules::compare_names(a, b));
    Ok(names)
}

pub fn list_projects_including_ideas(domain: &Path) -> AppResult<Vec<ProjectRef>> {
    let entries = fs::read_dir(domain).map_err(|error| AppError::Access(error.to_string()))?;
    let mut refs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|error| AppError::Access(error.to_string()))?;
        let name = entry_name(&entry);
        if is_hidden(&name) || !entry.path().is_dir() {
            continue;
        }
        if name == rules::IDEAS_FOLDER {
            let ideas_dir = entry.path();
            if let Ok(children) = fs::read_dir(&ideas_dir) {
                for child in children.flatten() {
                    let child_name = entry_name(&child);
                    if is_hidden(&child_name) || !child.path().is_dir() {
                        continue;
                    }
                    refs.push(ProjectRef::new(&ideas_dir, child_name));
                }
            }
        } else {
            refs.push(ProjectRef::new(domain, name));
        }
    }
    refs.sort();
    Ok(refs)
}

// Unreadable or malformed files contribute nothing and never abort the walk.
pub fn harvest_tags(scan_root: &Path) -> HashSet<String> {
    let mut tags = HashSet::new();
    collect_tags(scan_root, &mut tags);
    tags
}

fn collect_tags(dir: &Path, tags: &mut HashSet<String>) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };
    for entry in entries.flatten() {
        let name = entry_name(&entry);
        if is_hidden(&name) {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            collect_tags(&path, tags);
        } else if name == store::SIDECAR_FILE {
            merge_sidecar_tags(&path, tags);
        }
    }
}

fn merge_sidecar_tags(path: &Path, tags: &mut HashSet<String>) {
    let parsed = fs::read(path)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<Value>(&bytes).ok());
    let document = match parsed {
        Some(document) => document,
        None => {
            tracing::warn!(path = %path.to_string_lossy(), "skipping unreadable project file during tag harvest");
            return;
        }
    };
    // A tags array counts only when every element is a string.
    let values = match document.get("tags").and_then(Value::as_array) {
        Some(values) if values.iter().all(Value::is_string) => values,
        _ => return,
    };
    for value in values {
        if let Some(tag) = value.as_str() {
            tags.insert(tag.to_string());
        }
    }
}

pub fn entry_count_excluding_sidecar(dir: &Path) -> usize {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return 0,
    };
    entries
        .flatten()
        .filter(|entry| {
            let name = entry_name(entry);
            !is_hidden(&name) && name != store::SIDECAR_FILE
        })
        .count()
}

fn entry_name(entry: &fs::DirEntry) -> String {
    entry.file_name().to_string_lossy().to_string()
}

fn leaf_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> tempfile::TempDir {
        tempfile::tempdir().expect("temp portfolio root")
    }

    fn write_sidecar(dir: &Path, contents: &str) {
        fs::create_dir_all(dir).expect("create project dir");
        fs::write(dir.join(store::SIDECAR_FILE), contents).expect("write sidecar");
    }

    #[test]
    fn domains_skip_hidden_and_reserved_and_sort_case_insensitively() {
        let root = temp_root();
        for name in ["Zeta", "_hidden_", "alpha", "Beta", ".cache"] {
            fs::create_dir(root.path().join(name)).expect("create domain");
        }
        fs::write(root.path().join("stray.txt"), "x").expect("write stray file");

        let domains = list_domains(root.path()).expect("list domains");
        let names: Vec<String> = domains.iter().map(|d| leaf_name(d)).collect();
        assert_eq!(names, vec!["alpha", "Beta", "Zeta"]);
    }

    #[test]
    fn missing_root_is_an_access_error() {
        let root = temp_root();
        let gone = root.path().join("nope");
        match list_domains(&gone) {
            Err(AppError::Access(_)) => {}
            other => panic!("expected access error, got {:?}", other),
        }
    }

    #[test]
    fn project_names_include_reserved_tabs() {
        let root = temp_root();
        let domain = root.path().join("Technology");
        for name in ["AppOne", rules::IDEAS_FOLDER, "zeta"] {
            fs::create_dir_all(domain.join(name)).expect("create project");
        }
        fs::write(domain.join("readme.md"), "x").expect("write file");

        let names = list_projects(&domain).expect("list projects");
        assert_eq!(names, vec![rules::IDEAS_FOLDER, "AppOne", "zeta"]);
    }

    #[test]
    fn ideas_children_are_flattened_into_the_listing() {
        let root = temp_root();
        let domain = root.path().join("Creative");
        let ideas = domain.join(rules::IDEAS_FOLDER);
        fs::create_dir_all(domain.join("AppOne")).expect("create project");
        fs::create_dir_all(ideas.join("SketchX")).expect("create idea");
        fs::create_dir_all(domain.join("zeta")).expect("create project");

        let refs = list_projects_including_ideas(&domain).expect("list refs");
        let names: Vec<&str> = refs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["AppOne", "SketchX", "zeta"]);
        assert_eq!(refs[0].parent, domain);
        assert_eq!(refs[1].parent, ideas);
        assert_eq!(refs[1].dir(), ideas.join("SketchX"));
    }

    #[test]
    fn tag_harvest_unions_and_tolerates_malformed_files() {
        let root = temp_root();
        write_sidecar(
            &root.path().join("D1").join("P1"),
            r#"{"tags": ["a", "b"]}"#,
        );
        write_sidecar(
            &root.path().join("D2").join("P2"),
            r#"{"tags": ["b", "c"]}"#,
        );
        write_sidecar(&root.path().join("D2").join("P3"), "not json at all");
        write_sidecar(&root.path().join(".hidden").join("P4"), r#"{"tags": ["z"]}"#);

        let tags = harvest_tags(root.path());
        let mut sorted: Vec<&str> = tags.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        assert_eq!(sorted, vec!["a", "b", "c"]);
    }

    #[test]
    fn mixed_type_tag_arrays_contribute_nothing() {
        let root = temp_root();
        write_sidecar(
            &root.path().join("D1").join("P1"),
            r#"{"tags": ["a", 7, "b"]}"#,
        );
        assert!(harvest_tags(root.path()).is_empty());
    }

    #[test]
    fn entry_count_ignores_sidecar_and_hidden_entries() {
        let root = temp_root();
        let project = root.path().join("Technology").join("AppOne");
        fs::create_dir_all(project.join("assets")).expect("create subdir");
        fs::write(project.join(store::SIDECAR_FILE), "{}").expect("write sidecar");
        fs::write(project.join("notes.txt"), "x").expect("write file");
        fs::write(project.join(".DS_Store"), "x").expect("write hidden file");

        assert_eq!(entry_count_excluding_sidecar(&project), 2);
        assert_eq!(entry_count_excluding_sidecar(&root.path().join("gone")), 0);
    }
}

use std::cmp::Ordering;

pub const IDEAS_FOLDER: &str = "_IDEAS_";

pub fn is_reserved_folder(name: &str) -> bool {
    name.len() >= 2 && name.starts_with('_') && name.ends_with('_')
}

pub fn is_domain_folder(name: &str) -> bool {
    !is_reserved_folder(name)
}

pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

pub fn display_name(raw: &str) -> String {
    let trimmed = raw.trim_matches('_');
    let mut chars = trimmed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_folders_are_underscore_wrapped() {
        assert!(is_reserved_folder("_IDEAS_"));
        assert!(is_reserved_folder("_archive_"));
        assert!(is_reserved_folder("__"));
        assert!(!is_reserved_folder("_"));
        assert!(!is_reserved_folder("_drafts"));
        assert!(!is_reserved_folder("drafts_"));
        assert!(!is_reserved_folder("Technology"));
        assert!(!is_reserved_folder(""));
    }

    #[test]
    fn domain_folders_are_everything_else() {
        assert!(is_domain_folder("Technology"));
        assert!(is_domain_folder("_"));
        assert!(!is_domain_folder(IDEAS_FOLDER));
    }

    #[test]
    fn display_name_trims_and_recases() {
        assert_eq!(display_name("_IDEAS_"), "Ideas");
        assert_eq!(display_name("_ARCHIVE_"), "Archive");
        assert_eq!(display_name("technology"), "Technology");
        assert_eq!(display_name("MyGames"), "Mygames");
    }

    #[test]
    fn display_name_falls_back_when_trimming_empties() {
        assert_eq!(display_name("___"), "___");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn compare_names_is_case_insensitive_with_stable_ties() {
        let mut names = vec!["Zeta", "alpha", "Beta"];
        names.sort_by(|a, b| compare_names(a, b));
        assert_eq!(names, vec!["alpha", "Beta", "Zeta"]);

        assert_eq!(compare_names("app", "App"), Ordering::Greater);
        assert_eq!(compare_names("App", "App"), Ordering::Equal);
    }
}

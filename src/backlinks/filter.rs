//! Which documents take part in backlink generation

use super::settings::BacklinkSettings;
use crate::core::file_system::VaultFile;

/// Literal prefix match; blank entries never match
fn matches_any(path: &str, prefixes: &[String]) -> bool {
    prefixes
        .iter()
        .filter(|prefix| !prefix.trim().is_empty())
        .any(|prefix| path.starts_with(prefix.as_str()))
}

/// Markdown documents outside every exclude prefix and, when include
/// prefixes are configured, inside at least one of them.
pub fn should_process(file: &VaultFile, settings: &BacklinkSettings) -> bool {
    if !file.is_markdown() {
        return false;
    }
    let path = file.path();
    if matches_any(path, &settings.exclude_folders) {
        return false;
    }
    let has_includes = settings
        .include_folders
        .iter()
        .any(|prefix| !prefix.trim().is_empty());
    !has_includes || matches_any(path, &settings.include_folders)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(include: &[&str], exclude: &[&str]) -> BacklinkSettings {
        BacklinkSettings {
            include_folders: include.iter().map(|s| s.to_string()).collect(),
            exclude_folders: exclude.iter().map(|s| s.to_string()).collect(),
            ..BacklinkSettings::default()
        }
    }

    #[test]
    fn test_everything_allowed_by_default() {
        let s = settings(&[], &[]);
        assert!(should_process(&VaultFile::new("any/where/note.md"), &s));
        assert!(should_process(&VaultFile::new("top.md"), &s));
    }

    #[test]
    fn test_non_markdown_never_processed() {
        let s = settings(&[], &[]);
        assert!(!should_process(&VaultFile::new("Projects/diagram.canvas"), &s));
        assert!(!should_process(&VaultFile::new("Projects/photo.png"), &s));
    }

    #[test]
    fn test_exclude_beats_include() {
        let s = settings(&["Projects"], &["Projects/Archive"]);
        assert!(should_process(&VaultFile::new("Projects/Alpha/a.md"), &s));
        assert!(!should_process(&VaultFile::new("Projects/Archive/old.md"), &s));
    }

    #[test]
    fn test_include_restricts() {
        let s = settings(&["Projects/", "Areas/"], &[]);
        assert!(should_process(&VaultFile::new("Areas/health.md"), &s));
        assert!(!should_process(&VaultFile::new("Inbox/today.md"), &s));
    }

    #[test]
    fn test_prefix_is_literal_not_glob() {
        let s = settings(&["Proj*"], &[]);
        assert!(!should_process(&VaultFile::new("Projects/a.md"), &s));
        let s = settings(&["Proj"], &[]);
        assert!(should_process(&VaultFile::new("Projects/a.md"), &s));
    }

    #[test]
    fn test_blank_prefixes_are_ignored() {
        let s = settings(&[""], &["  "]);
        assert!(should_process(&VaultFile::new("a/b.md"), &s));
    }
}

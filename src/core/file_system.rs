//! Vault file tree and text I/O

use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

/// Extension of documents that take part in backlink generation
pub const MARKDOWN_EXTENSION: &str = "md";

/// Errors raised by vault I/O
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Not a document: '{0}'")]
    NotAFile(String),
}

/// A folder in the vault. The vault root has the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VaultFolder {
    path: String,
}

impl VaultFolder {
    /// The vault root folder
    pub fn root() -> Self {
        Self {
            path: String::new(),
        }
    }

    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: normalize(&path.into()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Last path segment (empty for the root)
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Parent folder, `None` for the root
    pub fn parent(&self) -> Option<VaultFolder> {
        if self.is_root() {
            return None;
        }
        Some(match self.path.rfind('/') {
            Some(idx) => Self::new(&self.path[..idx]),
            None => Self::root(),
        })
    }

    /// Path of a child entry with the given name
    pub fn child_path(&self, name: &str) -> String {
        if self.is_root() {
            name.to_string()
        } else {
            format!("{}/{}", self.path, name)
        }
    }
}

/// A document in the vault
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VaultFile {
    path: String,
}

impl VaultFile {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: normalize(&path.into()),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// File name including extension
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// File name without extension
    pub fn basename(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[..idx],
            _ => name,
        }
    }

    pub fn extension(&self) -> &str {
        let name = self.name();
        match name.rfind('.') {
            Some(idx) if idx > 0 => &name[idx + 1..],
            _ => "",
        }
    }

    /// Check if this is a markdown file
    pub fn is_markdown(&self) -> bool {
        self.extension() == MARKDOWN_EXTENSION
    }

    /// Containing folder; files at the vault top level belong to the root
    pub fn parent(&self) -> VaultFolder {
        match self.path.rfind('/') {
            Some(idx) => VaultFolder::new(&self.path[..idx]),
            None => VaultFolder::root(),
        }
    }

    /// A folder note is named after the folder that contains it
    pub fn is_folder_note(&self) -> bool {
        let parent = self.parent();
        !parent.is_root() && self.basename() == parent.name()
    }
}

/// Either kind of vault entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEntry {
    File(VaultFile),
    Folder(VaultFolder),
}

impl VaultEntry {
    pub fn as_file(&self) -> Option<&VaultFile> {
        match self {
            VaultEntry::File(file) => Some(file),
            VaultEntry::Folder(_) => None,
        }
    }

    #[cfg(test)]
    pub fn as_folder(&self) -> Option<&VaultFolder> {
        match self {
            VaultEntry::Folder(folder) => Some(folder),
            VaultEntry::File(_) => None,
        }
    }
}

/// File tree and text access the host hands to plugins
pub trait Vault: Send + Sync {
    /// All markdown documents in the vault, sorted by path
    fn markdown_files(&self) -> Vec<VaultFile>;

    /// Look up an entry by vault-relative path
    fn entry(&self, path: &str) -> Option<VaultEntry>;

    /// Read a whole document as text
    fn read(&self, file: &VaultFile) -> Result<String, VaultError>;

    /// Replace a whole document's text
    fn modify(&self, file: &VaultFile, content: &str) -> Result<(), VaultError>;

    /// Look up a document by path
    fn file(&self, path: &str) -> Option<VaultFile> {
        self.entry(path).and_then(|entry| entry.as_file().cloned())
    }

    /// Markdown documents anywhere below `folder`
    fn files_under(&self, folder: &VaultFolder) -> Vec<VaultFile> {
        let prefix = folder.child_path("");
        self.markdown_files()
            .into_iter()
            .filter(|file| folder.is_root() || file.path().starts_with(&prefix))
            .collect()
    }
}

/// A vault backed by a directory on disk
#[derive(Debug, Clone)]
pub struct DiskVault {
    root: PathBuf,
}

impl DiskVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a vault-relative path
    pub fn absolute_path(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .fold(self.root.clone(), |acc, segment| acc.join(segment))
    }

    /// Vault-relative path of an absolute path, `None` when outside the vault
    /// or inside a hidden directory
    pub fn relative_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let mut segments = Vec::new();
        for component in relative.components() {
            let segment = component.as_os_str().to_string_lossy();
            if is_hidden(&segment) {
                return None;
            }
            segments.push(segment.to_string());
        }
        Some(segments.join("/"))
    }
}

impl Vault for DiskVault {
    fn markdown_files(&self) -> Vec<VaultFile> {
        let mut files: Vec<VaultFile> = WalkDir::new(&self.root)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| self.relative_path(e.path()))
            .map(VaultFile::new)
            .filter(VaultFile::is_markdown)
            .collect();
        files.sort_by(|a, b| a.path().cmp(b.path()));
        files
    }

    fn entry(&self, path: &str) -> Option<VaultEntry> {
        let normalized = normalize(path);
        if normalized.split('/').any(is_hidden) {
            return None;
        }
        let metadata = std::fs::metadata(self.absolute_path(&normalized)).ok()?;
        if metadata.is_dir() {
            Some(VaultEntry::Folder(VaultFolder::new(normalized)))
        } else if metadata.is_file() {
            Some(VaultEntry::File(VaultFile::new(normalized)))
        } else {
            None
        }
    }

    fn read(&self, file: &VaultFile) -> Result<String, VaultError> {
        std::fs::read_to_string(self.absolute_path(file.path())).map_err(|source| VaultError::Read {
            path: file.path().to_string(),
            source,
        })
    }

    fn modify(&self, file: &VaultFile, content: &str) -> Result<(), VaultError> {
        let target = self.absolute_path(file.path());
        if !target.is_file() {
            return Err(VaultError::NotAFile(file.path().to_string()));
        }
        std::fs::write(&target, content).map_err(|source| VaultError::Write {
            path: file.path().to_string(),
            source,
        })
    }
}

fn is_hidden(segment: &str) -> bool {
    segment.starts_with('.') && segment != "." && segment != ".."
}

fn normalize(path: &str) -> String {
    path.replace('\\', "/")
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_file_accessors() {
        let file = VaultFile::new("Projects/Alpha/notes.md");
        assert_eq!(file.name(), "notes.md");
        assert_eq!(file.basename(), "notes");
        assert_eq!(file.extension(), "md");
        assert_eq!(file.parent().path(), "Projects/Alpha");
        assert_eq!(file.parent().name(), "Alpha");
        assert!(file.is_markdown());
        assert!(!file.is_folder_note());
    }

    #[test]
    fn test_folder_note_detection() {
        assert!(VaultFile::new("A/B/B.md").is_folder_note());
        assert!(!VaultFile::new("B.md").is_folder_note());
    }

    #[test]
    fn test_folder_parent_chain_ends_at_root() {
        let folder = VaultFolder::new("A/B");
        let parent = folder.parent().unwrap();
        assert_eq!(parent.path(), "A");
        let root = parent.parent().unwrap();
        assert!(root.is_root());
        assert!(root.parent().is_none());
    }

    #[test]
    fn test_top_level_file_belongs_to_root() {
        assert!(VaultFile::new("readme.md").parent().is_root());
    }

    #[test]
    fn test_dotfile_has_no_extension() {
        let file = VaultFile::new(".hidden");
        assert_eq!(file.extension(), "");
        assert_eq!(file.basename(), ".hidden");
    }

    #[test]
    fn test_disk_vault_lists_markdown_and_skips_hidden() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("A/B")).unwrap();
        fs::create_dir_all(dir.path().join(".backlinks")).unwrap();
        fs::write(dir.path().join("A/B/C.md"), "c").unwrap();
        fs::write(dir.path().join("A/image.png"), "").unwrap();
        fs::write(dir.path().join("top.md"), "").unwrap();
        fs::write(dir.path().join(".backlinks/hidden.md"), "").unwrap();

        let vault = DiskVault::new(dir.path());
        let paths: Vec<String> = vault
            .markdown_files()
            .iter()
            .map(|f| f.path().to_string())
            .collect();
        assert_eq!(paths, vec!["A/B/C.md", "top.md"]);
    }

    #[test]
    fn test_disk_vault_entry_kinds() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("A")).unwrap();
        fs::write(dir.path().join("A/note.md"), "").unwrap();

        let vault = DiskVault::new(dir.path());
        assert!(vault.entry("A").unwrap().as_folder().is_some());
        assert!(vault.entry("A/note.md").unwrap().as_file().is_some());
        assert!(vault.entry("A/missing.md").is_none());
        assert!(vault.file("A").is_none());
    }

    #[test]
    fn test_disk_vault_read_modify() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("note.md"), "before").unwrap();

        let vault = DiskVault::new(dir.path());
        let file = vault.file("note.md").unwrap();
        vault.modify(&file, "after").unwrap();
        assert_eq!(vault.read(&file).unwrap(), "after");
    }

    #[test]
    fn test_modify_missing_file_fails() {
        let dir = tempdir().unwrap();
        let vault = DiskVault::new(dir.path());
        let result = vault.modify(&VaultFile::new("gone.md"), "x");
        assert!(matches!(result, Err(VaultError::NotAFile(_))));
    }

    #[test]
    fn test_relative_path() {
        let dir = tempdir().unwrap();
        let vault = DiskVault::new(dir.path());
        assert_eq!(
            vault.relative_path(&dir.path().join("A").join("b.md")),
            Some("A/b.md".to_string())
        );
        assert_eq!(vault.relative_path(&dir.path().join(".backlinks").join("x.md")), None);
        assert_eq!(vault.relative_path(Path::new("/elsewhere/x.md")), None);
    }

    #[test]
    fn test_files_under_folder() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("A/B")).unwrap();
        fs::create_dir_all(dir.path().join("AB")).unwrap();
        fs::write(dir.path().join("A/B/one.md"), "").unwrap();
        fs::write(dir.path().join("A/two.md"), "").unwrap();
        fs::write(dir.path().join("AB/three.md"), "").unwrap();

        let vault = DiskVault::new(dir.path());
        let files: Vec<String> = vault
            .files_under(&VaultFolder::new("A"))
            .iter()
            .map(|f| f.path().to_string())
            .collect();
        assert_eq!(files, vec!["A/B/one.md", "A/two.md"]);
    }
}

//! Documents loaded from a vault for rewriting

use super::file_system::{Vault, VaultError, VaultFile};

/// A markdown document read from the vault
#[derive(Debug, Clone)]
pub struct Document {
    /// Vault file
    pub file: VaultFile,
    /// Document content
    pub content: String,
    /// Whether the content differs from what was read
    pub modified: bool,
}

impl Document {
    /// Read a document from the vault
    pub fn open(vault: &dyn Vault, file: &VaultFile) -> Result<Self, VaultError> {
        let content = vault.read(file)?;
        Ok(Self {
            file: file.clone(),
            content,
            modified: false,
        })
    }

    /// Update content and mark as modified. Returns whether anything changed.
    pub fn set_content(&mut self, content: String) -> bool {
        if self.content != content {
            self.content = content;
            self.modified = true;
        }
        self.modified
    }

    /// Write the document back if it was modified. Returns whether a write happened.
    pub fn save(&mut self, vault: &dyn Vault) -> Result<bool, VaultError> {
        if !self.modified {
            tracing::debug!("Unchanged, skipping write: {}", self.file.path());
            return Ok(false);
        }
        vault.modify(&self.file, &self.content)?;
        self.modified = false;
        tracing::info!("Saved document: {}", self.file.path());
        Ok(true)
    }

    /// Apply a transformation and write the result when it differs
    pub fn rewrite(
        vault: &dyn Vault,
        file: &VaultFile,
        transform: impl FnOnce(&str) -> String,
    ) -> Result<bool, VaultError> {
        let mut doc = Self::open(vault, file)?;
        let updated = transform(&doc.content);
        doc.set_content(updated);
        doc.save(vault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::file_system::DiskVault;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_set_content_tracks_changes() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "text").unwrap();
        let vault = DiskVault::new(dir.path());

        let mut doc = Document::open(&vault, &VaultFile::new("a.md")).unwrap();
        assert!(!doc.set_content("text".to_string()));
        assert!(doc.set_content("other".to_string()));
    }

    #[test]
    fn test_rewrite_skips_identical_output() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.md"), "same").unwrap();
        let vault = DiskVault::new(dir.path());
        let file = VaultFile::new("a.md");

        assert!(!Document::rewrite(&vault, &file, |text| text.to_string()).unwrap());
        assert!(Document::rewrite(&vault, &file, |text| format!("{text}!")).unwrap());
        assert_eq!(fs::read_to_string(dir.path().join("a.md")).unwrap(), "same!");
    }

    #[test]
    fn test_open_missing_document_fails() {
        let dir = tempdir().unwrap();
        let vault = DiskVault::new(dir.path());
        let result = Document::open(&vault, &VaultFile::new("missing.md"));
        assert!(matches!(result, Err(VaultError::Read { .. })));
    }
}

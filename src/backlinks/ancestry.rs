//! Ancestor folder references for a document

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::file_system::{VaultFile, VaultFolder};

/// Which ancestors a document links to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkPolicy {
    /// Every ancestor folder, root first
    #[default]
    FullChain,
    /// Only the nearest ancestor; folder notes link to their grandparent
    ImmediateParent,
}

impl std::str::FromStr for LinkPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full-chain" => Ok(Self::FullChain),
            "immediate-parent" => Ok(Self::ImmediateParent),
            other => Err(format!(
                "unknown policy '{other}', expected 'full-chain' or 'immediate-parent'"
            )),
        }
    }
}

/// A wiki link to a folder or document path, rendered as `[[path]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceToken(String);

impl ReferenceToken {
    pub fn for_folder(folder: &VaultFolder) -> Self {
        Self(folder.path().to_string())
    }

    pub fn for_path(path: &str) -> Self {
        Self(path.to_string())
    }

    #[cfg(test)]
    pub fn target(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[[{}]]", self.0)
    }
}

/// Ancestor folders of `file` below the vault root, nearest first
pub fn ancestor_folders(file: &VaultFile) -> Vec<VaultFolder> {
    let mut folders = Vec::new();
    let mut current = Some(file.parent());
    while let Some(folder) = current {
        if folder.is_root() {
            break;
        }
        current = folder.parent();
        folders.push(folder);
    }
    folders
}

/// References `file` should carry in its generated section
pub fn ancestor_references(file: &VaultFile, policy: LinkPolicy) -> Vec<ReferenceToken> {
    let ancestors = ancestor_folders(file);
    match policy {
        LinkPolicy::FullChain => ancestors.iter().rev().map(ReferenceToken::for_folder).collect(),
        LinkPolicy::ImmediateParent => {
            let skip = usize::from(file.is_folder_note());
            ancestors
                .get(skip)
                .map(ReferenceToken::for_folder)
                .into_iter()
                .collect()
        }
    }
}

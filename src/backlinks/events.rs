//! Reactions to vault lifecycle events and the bulk rewrite

use super::ancestry::{ancestor_folders, ancestor_references, ReferenceToken};
use super::filter::should_process;
use super::settings::BacklinkSettings;
use super::splice::{remove_reference, splice_backlinks};
use crate::core::document::Document;
use crate::core::file_system::{
    Vault, VaultEntry, VaultError, VaultFile, VaultFolder, MARKDOWN_EXTENSION,
};
use crate::plugin::api::Host;

const PROGRESS_INTERVAL: usize = 50;

/// Outcome of rewriting every eligible document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.updated + self.unchanged
    }
}

/// Regenerate the section of one document. Returns whether it was written.
pub fn update_document(
    vault: &dyn Vault,
    file: &VaultFile,
    settings: &BacklinkSettings,
) -> Result<bool, VaultError> {
    let references = ancestor_references(file, settings.policy);
    Document::rewrite(vault, file, |text| splice_backlinks(text, &references))
}

/// The note representing `folder`: `F/N.md` inside the folder, else the
/// sibling `N.md` next to it
pub fn find_folder_note(vault: &dyn Vault, folder: &VaultFolder) -> Option<VaultFile> {
    if folder.is_root() {
        return None;
    }
    let note_name = format!("{}.{}", folder.name(), MARKDOWN_EXTENSION);
    let inside = folder.child_path(&note_name);
    if let Some(note) = vault.file(&inside) {
        return Some(note);
    }
    let beside = folder.parent()?.child_path(&note_name);
    vault.file(&beside)
}

/// Folder notes of every ancestor of `file` that may be rewritten
fn eligible_folder_notes(
    vault: &dyn Vault,
    file: &VaultFile,
    settings: &BacklinkSettings,
) -> Vec<VaultFile> {
    let mut notes: Vec<VaultFile> = Vec::new();
    for folder in ancestor_folders(file) {
        let Some(note) = find_folder_note(vault, &folder) else {
            continue;
        };
        if note != *file && should_process(&note, settings) && !notes.contains(&note) {
            notes.push(note);
        }
    }
    notes
}

/// A document appeared: write its own section, then refresh the folder notes above it
pub fn handle_created(
    vault: &dyn Vault,
    path: &str,
    settings: &BacklinkSettings,
) -> Result<(), VaultError> {
    match vault.entry(path) {
        Some(VaultEntry::File(file)) => handle_document(vault, &file, settings),
        Some(VaultEntry::Folder(folder)) => handle_folder(vault, &folder, settings),
        None => {
            tracing::debug!("Entry vanished before it could be processed: {}", path);
            Ok(())
        }
    }
}

/// Renames are handled at the new location only
pub fn handle_renamed(
    vault: &dyn Vault,
    from: &str,
    to: &str,
    settings: &BacklinkSettings,
) -> Result<(), VaultError> {
    tracing::debug!("Renamed {} -> {}", from, to);
    handle_created(vault, to, settings)
}

fn handle_document(
    vault: &dyn Vault,
    file: &VaultFile,
    settings: &BacklinkSettings,
) -> Result<(), VaultError> {
    if !file.is_markdown() {
        return Ok(());
    }
    if should_process(file, settings) {
        update_document(vault, file, settings)?;
    } else {
        tracing::debug!("Skipping filtered document: {}", file.path());
    }
    for note in eligible_folder_notes(vault, file, settings) {
        update_document(vault, &note, settings)?;
    }
    Ok(())
}

/// Every ancestor chain below a moved folder changed
fn handle_folder(
    vault: &dyn Vault,
    folder: &VaultFolder,
    settings: &BacklinkSettings,
) -> Result<(), VaultError> {
    for file in vault.files_under(folder) {
        if should_process(&file, settings) {
            update_document(vault, &file, settings)?;
        }
    }
    Ok(())
}

/// A document disappeared: strip literal links to it from the folder notes above it
pub fn handle_deleted(
    vault: &dyn Vault,
    path: &str,
    settings: &BacklinkSettings,
) -> Result<(), VaultError> {
    let file = VaultFile::new(path);
    if !file.is_markdown() {
        return Ok(());
    }
    let reference = ReferenceToken::for_path(file.path());
    for note in eligible_folder_notes(vault, &file, settings) {
        if Document::rewrite(vault, &note, |text| remove_reference(text, &reference))? {
            tracing::info!("Removed {} from {}", reference, note.path());
        }
    }
    Ok(())
}

/// Rewrite every eligible document. Failures are counted and never stop the batch.
pub fn process_all(host: &dyn Host, settings: &BacklinkSettings) -> BatchReport {
    let vault = host.vault();
    let files: Vec<VaultFile> = vault
        .markdown_files()
        .into_iter()
        .filter(|f| should_process(f, settings))
        .collect();
    let total = files.len();
    tracing::info!("Generating backlinks for {} documents", total);

    let mut report = BatchReport::default();
    for (index, file) in files.iter().enumerate() {
        match update_document(vault, file, settings) {
            Ok(true) => report.updated += 1,
            Ok(false) => report.unchanged += 1,
            Err(e) => {
                tracing::warn!("Failed to update {}: {}", file.path(), e);
                report.failed += 1;
            }
        }
        let done = index + 1;
        if done % PROGRESS_INTERVAL == 0 && done < total {
            host.notice(&format!("Backlinks: {}/{} documents", done, total));
        }
    }

    tracing::info!(
        "Backlinks done: {} updated, {} unchanged, {} failed",
        report.updated,
        report.unchanged,
        report.failed
    );
    host.notice(&format!(
        "Backlinks generated for {} documents ({} changed), {} failed",
        report.succeeded(),
        report.updated,
        report.failed
    ));
    report
}

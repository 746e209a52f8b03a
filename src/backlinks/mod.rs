//! Folder backlinks plugin
//!
//! Keeps a generated section at the end of every markdown document that links
//! to the folders above it, and keeps folder notes in step as documents come
//! and go.

pub mod ancestry;
pub mod events;
pub mod filter;
pub mod settings;
pub mod splice;

use anyhow::{bail, Result};

use crate::core::config::PluginDataStore;
use crate::core::watcher::VaultEvent;
use crate::plugin::api::{
    CommandOutcome, Host, Plugin, PluginCommand, PluginContext, PluginManifest,
};
use events::{handle_created, handle_deleted, handle_renamed, process_all};
use filter::should_process;
use settings::{BacklinkSettings, SettingsHandle};

pub const PLUGIN_ID: &str = "folder-backlinks";
pub const GENERATE_ALL_COMMAND: &str = "generate-backlinks";
pub const RELOAD_COMMAND: &str = "reload";
const PROCESS_ALL_ACTION: &str = "process-all";

/// Settings store of the backlinks plugin inside a plugin data root
pub fn settings_store(plugins_dir: &std::path::Path) -> PluginDataStore {
    PluginDataStore::new(&plugins_dir.join(PLUGIN_ID))
}

#[derive(Debug, Default)]
pub struct BacklinksPlugin {
    settings: Option<SettingsHandle>,
}

impl BacklinksPlugin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings in effect; defaults before the plugin is loaded
    pub fn settings(&self) -> BacklinkSettings {
        self.settings
            .as_ref()
            .map(|handle| handle.get().clone())
            .unwrap_or_default()
    }
}

impl Plugin for BacklinksPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest {
            id: PLUGIN_ID.to_string(),
            name: "Folder Backlinks".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            description: "Links every note to the folders above it".to_string(),
        }
    }

    fn on_load(&mut self, ctx: &PluginContext) -> Result<()> {
        let handle = SettingsHandle::load(PluginDataStore::new(&ctx.data_dir));
        tracing::info!(
            "Backlinks loaded for {} ({:?} policy, {} include, {} exclude prefixes)",
            ctx.vault_path.display(),
            handle.get().policy,
            handle.get().include_folders.len(),
            handle.get().exclude_folders.len()
        );
        self.settings = Some(handle);
        Ok(())
    }

    fn on_unload(&mut self) {
        self.settings = None;
    }

    fn on_vault_event(&mut self, host: &dyn Host, event: &VaultEvent) -> Result<()> {
        let settings = self.settings();
        let vault = host.vault();
        match event {
            VaultEvent::Created(path) => handle_created(vault, path, &settings)?,
            VaultEvent::Renamed { from, to } => handle_renamed(vault, from, to, &settings)?,
            VaultEvent::Deleted(path) => handle_deleted(vault, path, &settings)?,
        }
        Ok(())
    }

    fn on_command(&mut self, host: &dyn Host, id: &str) -> Result<CommandOutcome> {
        match id {
            GENERATE_ALL_COMMAND => {
                let settings = self.settings();
                let count = host
                    .vault()
                    .markdown_files()
                    .iter()
                    .filter(|file| should_process(file, &settings))
                    .count();
                Ok(CommandOutcome::Confirm {
                    prompt: format!("Rewrite the backlinks section of {} documents?", count),
                    action: PROCESS_ALL_ACTION.to_string(),
                })
            }
            RELOAD_COMMAND => Ok(CommandOutcome::Reload),
            other => bail!("Unknown command: {}", other),
        }
    }

    fn on_confirmed(&mut self, host: &dyn Host, action: &str) -> Result<()> {
        if action != PROCESS_ALL_ACTION {
            bail!("Unknown action: {}", action);
        }
        process_all(host, &self.settings());
        Ok(())
    }

    fn commands(&self) -> Vec<PluginCommand> {
        vec![
            PluginCommand::new(GENERATE_ALL_COMMAND, "Generate backlinks for all documents")
                .with_hotkey(self.settings().parsed_hotkey()),
            PluginCommand::new(RELOAD_COMMAND, "Reload the backlinks plugin"),
        ]
    }
}

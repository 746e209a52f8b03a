//! Application configuration management

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Hidden directory inside a vault holding host data
pub const VAULT_DATA_DIR: &str = ".backlinks";

const MAX_RECENT_VAULTS: usize = 10;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Last opened vault path
    pub last_vault: Option<PathBuf>,
    /// Recent vaults
    pub recent_vaults: Vec<PathBuf>,
    /// Plugin settings
    pub plugins: PluginConfig,
}

/// Plugin settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginConfig {
    /// Plugin data directory override
    pub plugin_dir: Option<PathBuf>,
    /// Plugins disabled by the user; everything else is enabled
    pub disabled_plugins: Vec<String>,
}

impl AppConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "folder-backlinks", "FolderBacklinks")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Result<Self> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        Self::load_from(&path)
    }

    /// Load configuration from an explicit file, defaulting when absent
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&path)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        tracing::info!("Saved config to: {}", path.display());
        Ok(())
    }

    /// Add a vault to recent vaults
    pub fn add_recent_vault(&mut self, path: PathBuf) {
        // Remove if already exists
        self.recent_vaults.retain(|p| p != &path);
        // Add to front
        self.recent_vaults.insert(0, path.clone());
        self.recent_vaults.truncate(MAX_RECENT_VAULTS);
        self.last_vault = Some(path);
    }

    /// Get the plugin data directory for a vault
    pub fn get_plugin_dir(&self, vault: &Path) -> PathBuf {
        self.plugins
            .plugin_dir
            .clone()
            .unwrap_or_else(|| vault.join(VAULT_DATA_DIR).join("plugins"))
    }

    pub fn is_plugin_enabled(&self, id: &str) -> bool {
        !self.plugins.disabled_plugins.iter().any(|p| p == id)
    }
}

/// Flat key-value settings record persisted for one plugin
#[derive(Debug, Clone)]
pub struct PluginDataStore {
    path: PathBuf,
}

impl PluginDataStore {
    /// Store rooted at a plugin's data directory
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join("data.json"),
        }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored record. Missing or unreadable data yields `None`.
    pub fn load(&self) -> Option<serde_json::Value> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Failed to read plugin data {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring malformed plugin data {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Persist the record
    pub fn save<T: Serialize>(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(data)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        tracing::debug!("Saved plugin data to: {}", self.path.display());
        Ok(())
    }
}

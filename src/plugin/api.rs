//! Plugin API definitions

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::file_system::Vault;
use crate::core::watcher::VaultEvent;

/// Context provided to plugins
#[derive(Debug, Clone)]
pub struct PluginContext {
    /// Plugin data directory
    pub data_dir: PathBuf,
    /// Current vault path
    pub vault_path: PathBuf,
}

/// Services the host offers while a plugin handles an event or command
pub trait Host {
    /// The vault the plugin operates on
    fn vault(&self) -> &dyn Vault;

    /// Show a short notice to the user
    fn notice(&self, message: &str);
}

/// Plugin trait that all plugins must implement
pub trait Plugin: Send {
    /// Get the plugin manifest
    fn manifest(&self) -> PluginManifest;

    /// Called when the plugin is loaded
    fn on_load(&mut self, ctx: &PluginContext) -> Result<()>;

    /// Called when the plugin is unloaded
    fn on_unload(&mut self) {}

    /// Called for every vault lifecycle event
    fn on_vault_event(&mut self, _host: &dyn Host, _event: &VaultEvent) -> Result<()> {
        Ok(())
    }

    /// Handle a command from the user
    fn on_command(&mut self, _host: &dyn Host, _id: &str) -> Result<CommandOutcome> {
        Ok(CommandOutcome::Done)
    }

    /// Continue an action the user confirmed
    fn on_confirmed(&mut self, _host: &dyn Host, _action: &str) -> Result<()> {
        Ok(())
    }

    /// Get commands provided by this plugin
    fn commands(&self) -> Vec<PluginCommand> {
        Vec::new()
    }
}

/// What the host should do after a command ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Nothing further
    Done,
    /// Ask the user; on yes, hand `action` to [`Plugin::on_confirmed`]
    Confirm { prompt: String, action: String },
    /// Unload and load the plugin again
    Reload,
}

/// A command provided by a plugin
#[derive(Debug, Clone)]
pub struct PluginCommand {
    /// Command id
    pub id: String,
    /// Command description
    pub description: String,
    /// Default hotkey
    pub hotkey: Option<Hotkey>,
}

impl PluginCommand {
    /// Create a new plugin command
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            hotkey: None,
        }
    }

    /// Bind a hotkey to the command
    pub fn with_hotkey(mut self, hotkey: Option<Hotkey>) -> Self {
        self.hotkey = hotkey;
        self
    }
}

/// Plugin metadata
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PluginManifest {
    /// Plugin ID
    pub id: String,
    /// Plugin name
    pub name: String,
    /// Plugin version
    pub version: String,
    /// Plugin description
    pub description: String,
}

/// Hotkey modifiers, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Modifier {
    Ctrl,
    Alt,
    Shift,
    Meta,
}

impl Modifier {
    fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ctrl" | "control" | "mod" => Some(Self::Ctrl),
            "alt" | "option" => Some(Self::Alt),
            "shift" => Some(Self::Shift),
            "meta" | "cmd" | "super" => Some(Self::Meta),
            _ => None,
        }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ctrl => "Ctrl",
            Self::Alt => "Alt",
            Self::Shift => "Shift",
            Self::Meta => "Meta",
        };
        f.write_str(name)
    }
}

/// A key combination such as `Ctrl+Shift+B`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Hotkey {
    pub modifiers: Vec<Modifier>,
    pub key: String,
}

impl Hotkey {
    /// Parse `Mod+Mod+Key`. Modifiers are case-insensitive and may come in
    /// any order; the key is upper-cased.
    pub fn parse(s: &str) -> Option<Self> {
        let parts: Vec<&str> = s.split('+').map(str::trim).collect();
        let (key, modifiers) = parts.split_last()?;
        if key.is_empty() || Modifier::parse(key).is_some() {
            return None;
        }
        let mut modifiers = modifiers
            .iter()
            .map(|m| Modifier::parse(m))
            .collect::<Option<Vec<_>>>()?;
        modifiers.sort();
        modifiers.dedup();
        Some(Self {
            modifiers,
            key: key.to_uppercase(),
        })
    }
}

impl fmt::Display for Hotkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for modifier in &self.modifiers {
            write!(f, "{}+", modifier)?;
        }
        f.write_str(&self.key)
    }
}

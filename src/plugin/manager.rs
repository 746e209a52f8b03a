//! Plugin manager for loading and managing plugins

use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use super::api::{CommandOutcome, Host, Hotkey, Plugin, PluginCommand, PluginContext};
use crate::core::watcher::VaultEvent;

struct RegisteredPlugin {
    id: String,
    plugin: Box<dyn Plugin>,
    loaded: bool,
}

/// A command waiting for the user to confirm
#[derive(Debug, Clone)]
struct PendingConfirmation {
    plugin_id: String,
    prompt: String,
    action: String,
}

/// Plugin manager
pub struct PluginManager {
    /// Registered plugins, in registration order
    plugins: Vec<RegisteredPlugin>,
    /// Plugin data root
    plugins_dir: PathBuf,
    /// Current vault path
    vault_path: PathBuf,
    /// Hotkey bindings to (plugin id, command id)
    hotkeys: HashMap<Hotkey, (String, String)>,
    /// Confirmation the user has not answered yet
    pending: Option<PendingConfirmation>,
}

impl PluginManager {
    /// Create a new plugin manager
    pub fn new(plugins_dir: PathBuf, vault_path: PathBuf) -> Self {
        Self {
            plugins: Vec::new(),
            plugins_dir,
            vault_path,
            hotkeys: HashMap::new(),
            pending: None,
        }
    }

    /// Register a plugin without loading it
    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        let id = plugin.manifest().id;
        tracing::debug!("Registered plugin: {}", id);
        self.plugins.push(RegisteredPlugin {
            id,
            plugin,
            loaded: false,
        });
    }

    fn context_for(&self, id: &str) -> PluginContext {
        PluginContext {
            data_dir: self.plugins_dir.join(id),
            vault_path: self.vault_path.clone(),
        }
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut RegisteredPlugin> {
        self.plugins
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| anyhow!("Unknown plugin: {}", id))
    }

    /// Enable a plugin
    pub fn enable_plugin(&mut self, id: &str) -> Result<()> {
        let context = self.context_for(id);
        let entry = self.find_mut(id)?;
        if entry.loaded {
            return Ok(());
        }

        entry.plugin.on_load(&context)?;
        entry.loaded = true;
        let manifest = entry.plugin.manifest();
        tracing::info!("Loaded plugin: {} v{}", manifest.name, manifest.version);
        self.bind_hotkeys(id);
        Ok(())
    }

    /// Disable a plugin
    pub fn disable_plugin(&mut self, id: &str) -> Result<()> {
        let entry = self.find_mut(id)?;
        if entry.loaded {
            entry.plugin.on_unload();
            entry.loaded = false;
        }
        self.hotkeys.retain(|_, (plugin_id, _)| plugin_id != id);
        if self.pending.as_ref().is_some_and(|p| p.plugin_id == id) {
            self.pending = None;
        }
        tracing::info!("Disabled plugin: {}", id);
        Ok(())
    }

    /// Unload and load a plugin again
    pub fn reload_plugin(&mut self, id: &str) -> Result<()> {
        tracing::info!("Reloading plugin: {}", id);
        self.disable_plugin(id)?;
        self.enable_plugin(id)
    }

    fn bind_hotkeys(&mut self, id: &str) {
        let commands = match self.plugins.iter().find(|p| p.id == id) {
            Some(entry) => entry.plugin.commands(),
            None => return,
        };
        for command in commands {
            if let Some(hotkey) = command.hotkey {
                tracing::debug!("Bound {} to {}:{}", hotkey, id, command.id);
                self.hotkeys.insert(hotkey, (id.to_string(), command.id));
            }
        }
    }

    /// Get enabled plugin IDs
    pub fn enabled_plugins(&self) -> Vec<&str> {
        self.plugins
            .iter()
            .filter(|p| p.loaded)
            .map(|p| p.id.as_str())
            .collect()
    }

    /// Commands of all loaded plugins, with their plugin id
    pub fn commands(&self) -> Vec<(String, PluginCommand)> {
        self.plugins
            .iter()
            .filter(|p| p.loaded)
            .flat_map(|p| {
                p.plugin
                    .commands()
                    .into_iter()
                    .map(move |c| (p.id.clone(), c))
            })
            .collect()
    }

    /// Deliver a vault event to every loaded plugin. A failing plugin is
    /// logged and does not keep the others from seeing the event.
    pub fn dispatch_event(&mut self, host: &dyn Host, event: &VaultEvent) {
        for entry in self.plugins.iter_mut().filter(|p| p.loaded) {
            if let Err(e) = entry.plugin.on_vault_event(host, event) {
                tracing::error!("Plugin {} failed handling {:?}: {:#}", entry.id, event, e);
            }
        }
    }

    /// Resolve `plugin:command` or a bare command id
    fn resolve_command(&self, name: &str) -> Option<(String, String)> {
        if let Some((plugin_id, command_id)) = name.split_once(':') {
            return self
                .commands()
                .into_iter()
                .find(|(p, c)| p == plugin_id && c.id == command_id)
                .map(|(p, c)| (p, c.id));
        }
        self.commands()
            .into_iter()
            .find(|(_, c)| c.id == name)
            .map(|(p, c)| (p, c.id))
    }

    /// Execute a plugin command. Returns the prompt when the command waits
    /// for confirmation.
    pub fn execute_command(&mut self, host: &dyn Host, name: &str) -> Result<Option<String>> {
        let (plugin_id, command_id) = self
            .resolve_command(name)
            .ok_or_else(|| anyhow!("Unknown command: {}", name))?;
        tracing::debug!("Executing command {} in plugin {}", command_id, plugin_id);

        let outcome = self.find_mut(&plugin_id)?.plugin.on_command(host, &command_id)?;
        match outcome {
            CommandOutcome::Done => Ok(None),
            CommandOutcome::Confirm { prompt, action } => {
                self.pending = Some(PendingConfirmation {
                    plugin_id,
                    prompt: prompt.clone(),
                    action,
                });
                Ok(Some(prompt))
            }
            CommandOutcome::Reload => {
                self.reload_plugin(&plugin_id)?;
                host.notice(&format!("Reloaded {}", plugin_id));
                Ok(None)
            }
        }
    }

    /// Run the command bound to a hotkey, if any
    pub fn trigger_hotkey(&mut self, host: &dyn Host, hotkey: &Hotkey) -> Result<Option<String>> {
        let (plugin_id, command_id) = self
            .hotkeys
            .get(hotkey)
            .cloned()
            .ok_or_else(|| anyhow!("No command bound to {}", hotkey))?;
        self.execute_command(host, &format!("{}:{}", plugin_id, command_id))
    }

    /// Prompt of the confirmation waiting for an answer
    pub fn pending_prompt(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.prompt.as_str())
    }

    /// Answer the pending confirmation. Declining drops the action.
    pub fn answer_confirmation(&mut self, host: &dyn Host, accepted: bool) -> Result<()> {
        let Some(pending) = self.pending.take() else {
            return Ok(());
        };
        if !accepted {
            tracing::info!("Cancelled: {}", pending.action);
            host.notice("Cancelled");
            return Ok(());
        }
        self.find_mut(&pending.plugin_id)?
            .plugin
            .on_confirmed(host, &pending.action)
    }

    /// Unload every plugin
    pub fn shutdown(&mut self) {
        for entry in self.plugins.iter_mut().filter(|p| p.loaded) {
            entry.plugin.on_unload();
            entry.loaded = false;
        }
        self.hotkeys.clear();
        self.pending = None;
    }

    /// Get plugin count
    pub fn plugin_count(&self) -> usize {
        self.plugins.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::file_system::{DiskVault, Vault};
    use crate::plugin::api::PluginManifest;
    use std::cell::RefCell;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[derive(Default)]
    struct Calls {
        loads: usize,
        unloads: usize,
        events: Vec<VaultEvent>,
        confirmed: Vec<String>,
    }

    struct Probe {
        calls: Arc<Mutex<Calls>>,
    }

    impl Plugin for Probe {
        fn manifest(&self) -> PluginManifest {
            PluginManifest {
                id: "probe".into(),
                name: "Probe".into(),
                version: "0.0.1".into(),
                description: String::new(),
            }
        }

        fn on_load(&mut self, _ctx: &PluginContext) -> Result<()> {
            self.calls.lock().unwrap().loads += 1;
            Ok(())
        }

        fn on_unload(&mut self) {
            self.calls.lock().unwrap().unloads += 1;
        }

        fn on_vault_event(&mut self, _host: &dyn Host, event: &VaultEvent) -> Result<()> {
            self.calls.lock().unwrap().events.push(event.clone());
            Ok(())
        }

        fn on_command(&mut self, _host: &dyn Host, id: &str) -> Result<CommandOutcome> {
            Ok(match id {
                "ask" => CommandOutcome::Confirm {
                    prompt: "Sure?".into(),
                    action: "asked".into(),
                },
                "reload" => CommandOutcome::Reload,
                _ => CommandOutcome::Done,
            })
        }

        fn on_confirmed(&mut self, _host: &dyn Host, action: &str) -> Result<()> {
            self.calls.lock().unwrap().confirmed.push(action.to_string());
            Ok(())
        }

        fn commands(&self) -> Vec<PluginCommand> {
            vec![
                PluginCommand::new("ask", "Ask first").with_hotkey(Hotkey::parse("Ctrl+A")),
                PluginCommand::new("reload", "Reload"),
            ]
        }
    }

    struct TestHost {
        vault: DiskVault,
        notices: RefCell<Vec<String>>,
    }

    impl Host for TestHost {
        fn vault(&self) -> &dyn Vault {
            &self.vault
        }

        fn notice(&self, message: &str) {
            self.notices.borrow_mut().push(message.to_string());
        }
    }

    fn setup() -> (PluginManager, Arc<Mutex<Calls>>, TestHost, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let calls = Arc::new(Mutex::new(Calls::default()));
        let mut manager = PluginManager::new(dir.path().join("plugins"), dir.path().to_path_buf());
        manager.register(Box::new(Probe {
            calls: calls.clone(),
        }));
        let host = TestHost {
            vault: DiskVault::new(dir.path()),
            notices: RefCell::new(Vec::new()),
        };
        (manager, calls, host, dir)
    }

    #[test]
    fn test_plugin_manager_new() {
        let manager = PluginManager::new(PathBuf::from("plugins"), PathBuf::from("vault"));
        assert_eq!(manager.plugin_count(), 0);
    }

    #[test]
    fn test_events_only_reach_loaded_plugins() {
        let (mut manager, calls, host, _dir) = setup();
        let event = VaultEvent::Created("a.md".into());
        manager.dispatch_event(&host, &event);
        assert!(calls.lock().unwrap().events.is_empty());

        manager.enable_plugin("probe").unwrap();
        manager.dispatch_event(&host, &event);
        assert_eq!(calls.lock().unwrap().events, vec![event]);
    }

    #[test]
    fn test_confirmation_flow() {
        let (mut manager, calls, host, _dir) = setup();
        manager.enable_plugin("probe").unwrap();

        let prompt = manager.execute_command(&host, "ask").unwrap();
        assert_eq!(prompt.as_deref(), Some("Sure?"));
        assert_eq!(manager.pending_prompt(), Some("Sure?"));

        manager.answer_confirmation(&host, false).unwrap();
        assert!(calls.lock().unwrap().confirmed.is_empty());
        assert!(manager.pending_prompt().is_none());

        manager.execute_command(&host, "probe:ask").unwrap();
        manager.answer_confirmation(&host, true).unwrap();
        assert_eq!(calls.lock().unwrap().confirmed, vec!["asked"]);
    }

    #[test]
    fn test_reload_command_cycles_plugin() {
        let (mut manager, calls, host, _dir) = setup();
        manager.enable_plugin("probe").unwrap();
        manager.execute_command(&host, "reload").unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls.loads, 2);
        assert_eq!(calls.unloads, 1);
        assert_eq!(host.notices.borrow().as_slice(), ["Reloaded probe"]);
    }

    #[test]
    fn test_hotkey_triggers_bound_command() {
        let (mut manager, _calls, host, _dir) = setup();
        manager.enable_plugin("probe").unwrap();

        let hotkey = Hotkey::parse("ctrl+a").unwrap();
        let prompt = manager.trigger_hotkey(&host, &hotkey).unwrap();
        assert_eq!(prompt.as_deref(), Some("Sure?"));

        manager.disable_plugin("probe").unwrap();
        assert!(manager.trigger_hotkey(&host, &hotkey).is_err());
    }

    #[test]
    fn test_unknown_command_is_error() {
        let (mut manager, _calls, host, _dir) = setup();
        manager.enable_plugin("probe").unwrap();
        assert!(manager.execute_command(&host, "nope").is_err());
    }
}

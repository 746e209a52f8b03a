//! Application host: opens a vault, runs plugins, and talks to the user

use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::backlinks::settings::{parse_lines, SettingsHandle};
use crate::backlinks::{self, BacklinksPlugin, GENERATE_ALL_COMMAND, PLUGIN_ID};
use crate::cli::SettingsCommands;
use crate::core::config::AppConfig;
use crate::core::file_system::{DiskVault, Vault};
use crate::core::watcher::{VaultEvent, VaultWatcher};
use crate::plugin::api::{Host, Hotkey};
use crate::plugin::manager::PluginManager;

/// Host services backed by the terminal
pub struct ConsoleHost {
    vault: DiskVault,
    output: RefCell<Box<dyn Write>>,
}

impl ConsoleHost {
    pub fn new(vault: DiskVault) -> Self {
        Self::with_output(vault, Box::new(std::io::stdout()))
    }

    /// Host whose notices are written to `output` instead of stdout
    pub fn with_output(vault: DiskVault, output: Box<dyn Write>) -> Self {
        Self {
            vault,
            output: RefCell::new(output),
        }
    }
}

impl Host for ConsoleHost {
    fn vault(&self) -> &dyn Vault {
        &self.vault
    }

    fn notice(&self, message: &str) {
        let mut output = self.output.borrow_mut();
        if let Err(e) = writeln!(output, "{}", message).and_then(|_| output.flush()) {
            tracing::warn!("Could not show notice '{}': {}", message, e);
        }
    }
}

/// Main application state
pub struct BacklinksApp {
    /// Host services for the open vault
    pub host: ConsoleHost,
    /// Plugin manager
    pub plugin_manager: PluginManager,
    /// Application configuration
    pub config: AppConfig,
}

impl BacklinksApp {
    /// Open a vault and load the enabled plugins
    pub fn open(vault_path: PathBuf, mut config: AppConfig) -> Result<Self> {
        let vault_path = vault_path
            .canonicalize()
            .with_context(|| format!("Vault not found: {}", vault_path.display()))?;
        if !vault_path.is_dir() {
            bail!("Vault is not a directory: {}", vault_path.display());
        }

        config.add_recent_vault(vault_path.clone());
        if let Err(e) = config.save() {
            tracing::warn!("Could not save config: {:#}", e);
        }

        let mut plugin_manager =
            PluginManager::new(config.get_plugin_dir(&vault_path), vault_path.clone());
        plugin_manager.register(Box::new(BacklinksPlugin::new()));
        if config.is_plugin_enabled(PLUGIN_ID) {
            plugin_manager.enable_plugin(PLUGIN_ID)?;
        }

        tracing::info!(
            "Opened vault: {} ({} of {} plugins enabled)",
            vault_path.display(),
            plugin_manager.enabled_plugins().len(),
            plugin_manager.plugin_count()
        );
        Ok(Self {
            host: ConsoleHost::new(DiskVault::new(vault_path)),
            plugin_manager,
            config,
        })
    }

    /// Watch the vault and serve console commands until quit or ctrl-c
    pub async fn run_watch(&mut self) -> Result<()> {
        let (tx, mut events) = mpsc::unbounded_channel::<VaultEvent>();
        let _watcher =
            VaultWatcher::start(&self.host.vault, tx).context("Failed to start watcher")?;
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        println!(
            "Watching {}. Type 'help' for commands.",
            self.host.vault.root().display()
        );

        loop {
            tokio::select! {
                Some(event) = events.recv() => {
                    tracing::debug!("Vault event: {:?}", event);
                    self.plugin_manager.dispatch_event(&self.host, &event);
                }
                line = lines.next_line(), if stdin_open => match line {
                    Ok(Some(line)) => {
                        if !self.handle_console_line(&line) {
                            break;
                        }
                    }
                    Ok(None) => stdin_open = false,
                    Err(e) => {
                        tracing::warn!("Console input failed: {}", e);
                        stdin_open = false;
                    }
                },
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                    break;
                }
            }
        }

        self.plugin_manager.shutdown();
        Ok(())
    }

    /// Handle one console line. Returns false when the user asked to quit.
    pub fn handle_console_line(&mut self, line: &str) -> bool {
        let line = line.trim();

        if self.plugin_manager.pending_prompt().is_some() {
            let accepted = matches!(line.to_ascii_lowercase().as_str(), "y" | "yes");
            if let Err(e) = self.plugin_manager.answer_confirmation(&self.host, accepted) {
                tracing::error!("Command failed: {:#}", e);
            }
            return true;
        }

        if line.is_empty() {
            return true;
        }
        if line == "quit" || line == "exit" {
            return false;
        }

        let result = if line == "help" {
            self.print_help();
            Ok(None)
        } else if let Some(combo) = line.strip_prefix("key ") {
            match Hotkey::parse(combo) {
                Some(hotkey) => self.plugin_manager.trigger_hotkey(&self.host, &hotkey),
                None => Err(anyhow::anyhow!("Not a hotkey: {}", combo)),
            }
        } else {
            self.plugin_manager.execute_command(&self.host, line)
        };

        match result {
            Ok(Some(prompt)) => println!("{} [y/N]", prompt),
            Ok(None) => {}
            Err(e) => {
                tracing::error!("{:#}", e);
                println!("Error: {:#}", e);
            }
        }
        true
    }

    fn print_help(&self) {
        println!("Commands:");
        for (plugin_id, command) in self.plugin_manager.commands() {
            let hotkey = command
                .hotkey
                .map(|h| format!(" ({})", h))
                .unwrap_or_default();
            println!("  {}:{}{} - {}", plugin_id, command.id, hotkey, command.description);
        }
        println!("  key <hotkey> - run the command bound to a hotkey");
        println!("  quit - stop watching");
    }

    /// Rewrite every document once, asking first unless `assume_yes`
    pub fn run_process_all(&mut self, assume_yes: bool) -> Result<()> {
        let prompt = self
            .plugin_manager
            .execute_command(&self.host, GENERATE_ALL_COMMAND)?;
        let Some(prompt) = prompt else {
            return Ok(());
        };

        let accepted = assume_yes || ask_yes_no(&prompt)?;
        self.plugin_manager.answer_confirmation(&self.host, accepted)
    }

    /// Show or change the backlinks settings
    pub fn run_settings(&mut self, command: Option<SettingsCommands>) -> Result<()> {
        let plugins_dir = self.config.get_plugin_dir(self.host.vault.root());
        let mut handle = SettingsHandle::load(backlinks::settings_store(&plugins_dir));

        match command.unwrap_or(SettingsCommands::Show) {
            SettingsCommands::Show => {}
            SettingsCommands::Include { prefixes } => {
                handle.update(|s| s.include_folders = parse_lines(&prefixes.join("\n")))?
            }
            SettingsCommands::Exclude { prefixes } => {
                handle.update(|s| s.exclude_folders = parse_lines(&prefixes.join("\n")))?
            }
            SettingsCommands::Hotkey { hotkey } => {
                let normalized = match hotkey.as_deref() {
                    Some(raw) => match Hotkey::parse(raw) {
                        Some(parsed) => Some(parsed.to_string()),
                        None => bail!("Not a hotkey: {}", raw),
                    },
                    None => None,
                };
                handle.update(|s| s.hotkey = normalized)?
            }
            SettingsCommands::Policy { policy } => handle.update(|s| s.policy = policy)?,
        }

        println!("{}", serde_json::to_string_pretty(handle.get())?);
        Ok(())
    }
}

fn ask_yes_no(prompt: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

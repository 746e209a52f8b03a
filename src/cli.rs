use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::backlinks::ancestry::LinkPolicy;

#[derive(Parser, Debug)]
#[command(name = "folder-backlinks")]
#[command(about = "Keep folder backlink sections in a markdown vault up to date", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Vault directory (defaults to the last vault used)
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch the vault and update backlinks as documents are created, renamed or deleted
    Watch,
    /// Rewrite the backlinks section of every document
    ProcessAll {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or change plugin settings
    Settings {
        #[command(subcommand)]
        command: Option<SettingsCommands>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommands {
    /// Print the current settings
    Show,
    /// Replace the include prefixes; no arguments clears the list
    Include { prefixes: Vec<String> },
    /// Replace the exclude prefixes; no arguments clears the list
    Exclude { prefixes: Vec<String> },
    /// Set the hotkey for generating all backlinks; no argument clears it
    Hotkey { hotkey: Option<String> },
    /// Choose which ancestor folders get linked
    Policy { policy: LinkPolicy },
}

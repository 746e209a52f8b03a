//! Backlink plugin settings and their persistence

use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ancestry::LinkPolicy;
use crate::core::config::PluginDataStore;
use crate::plugin::api::Hotkey;

/// Settings record stored as flat JSON
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacklinkSettings {
    /// Path prefixes a document must start with (empty: no restriction)
    pub include_folders: Vec<String>,
    /// Path prefixes that exclude a document
    pub exclude_folders: Vec<String>,
    /// Key combination for "generate backlinks for all documents"
    pub hotkey: Option<String>,
    /// Which ancestors get linked
    pub policy: LinkPolicy,
}

fn field_or_default<T: DeserializeOwned + Default>(record: &Value, key: &str) -> T {
    match record.get(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => T::deserialize(value).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid setting '{}': {}", key, e);
            T::default()
        }),
    }
}

impl BacklinkSettings {
    /// Merge a stored record over the defaults, one key at a time. Missing or
    /// ill-typed keys keep their default.
    pub fn from_value(record: &Value) -> Self {
        if !record.is_object() {
            tracing::warn!("Ignoring settings record that is not an object");
            return Self::default();
        }
        Self {
            include_folders: field_or_default(record, "include_folders"),
            exclude_folders: field_or_default(record, "exclude_folders"),
            hotkey: field_or_default(record, "hotkey"),
            policy: field_or_default(record, "policy"),
        }
    }

    /// Parsed hotkey, `None` when unset or unparseable
    pub fn parsed_hotkey(&self) -> Option<Hotkey> {
        let raw = self.hotkey.as_deref()?.trim();
        if raw.is_empty() {
            return None;
        }
        let hotkey = Hotkey::parse(raw);
        if hotkey.is_none() {
            tracing::warn!("Ignoring unparseable hotkey: {}", raw);
        }
        hotkey
    }
}

/// Split a multi-line list field into trimmed, non-empty entries
pub fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Loaded settings plus the store they persist to
#[derive(Debug, Clone)]
pub struct SettingsHandle {
    store: PluginDataStore,
    current: BacklinkSettings,
}

impl SettingsHandle {
    /// Load settings, falling back to defaults for anything missing
    pub fn load(store: PluginDataStore) -> Self {
        let current = store
            .load()
            .map(|record| BacklinkSettings::from_value(&record))
            .unwrap_or_default();
        Self { store, current }
    }

    pub fn get(&self) -> &BacklinkSettings {
        &self.current
    }

    /// The only way settings change; the result is persisted immediately
    pub fn update(&mut self, mutate: impl FnOnce(&mut BacklinkSettings)) -> Result<()> {
        let mut next = self.current.clone();
        mutate(&mut next);
        self.store.save(&next)?;
        self.current = next;
        Ok(())
    }
}

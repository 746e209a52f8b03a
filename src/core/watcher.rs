//! File system watching for vault lifecycle events

use notify::event::{CreateKind, ModifyKind, RemoveKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::UnboundedSender;

use super::file_system::DiskVault;

/// Lifecycle event for a vault entry, with vault-relative paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VaultEvent {
    Created(String),
    Renamed { from: String, to: String },
    Deleted(String),
}

/// Keeps a recursive watcher on a vault alive
pub struct VaultWatcher {
    _watcher: RecommendedWatcher,
}

impl VaultWatcher {
    /// Start watching the vault, forwarding translated events to `tx`
    pub fn start(vault: &DiskVault, tx: UnboundedSender<VaultEvent>) -> notify::Result<Self> {
        let translator = vault.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for vault_event in translate(&translator, &event) {
                    if tx.send(vault_event).is_err() {
                        tracing::debug!("Event receiver closed, dropping watcher event");
                    }
                }
            }
            Err(e) => tracing::error!("Watch error: {:?}", e),
        })?;

        watcher.watch(vault.root(), RecursiveMode::Recursive)?;
        tracing::info!("Watching vault: {}", vault.root().display());

        Ok(Self { _watcher: watcher })
    }
}

/// Map a raw notify event onto vault events. Content modifications are
/// dropped so the plugin's own writes never come back as work.
pub fn translate(vault: &DiskVault, event: &Event) -> Vec<VaultEvent> {
    let relative: Vec<Option<String>> = event
        .paths
        .iter()
        .map(|p| vault.relative_path(p).filter(|p| !p.is_empty()))
        .collect();

    match event.kind {
        EventKind::Create(CreateKind::File)
        | EventKind::Create(CreateKind::Folder)
        | EventKind::Create(CreateKind::Any)
        | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            relative.into_iter().flatten().map(VaultEvent::Created).collect()
        }
        EventKind::Remove(RemoveKind::File)
        | EventKind::Remove(RemoveKind::Folder)
        | EventKind::Remove(RemoveKind::Any)
        | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            relative.into_iter().flatten().map(VaultEvent::Deleted).collect()
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match relative.as_slice() {
            [Some(from), Some(to)] => vec![VaultEvent::Renamed {
                from: from.clone(),
                to: to.clone(),
            }],
            // Moved in from a hidden or outside location
            [None, Some(to)] => vec![VaultEvent::Created(to.clone())],
            [Some(from), None] => vec![VaultEvent::Deleted(from.clone())],
            _ => Vec::new(),
        },
        // One side of a rename with no pairing; the entry's presence tells which
        EventKind::Modify(ModifyKind::Name(RenameMode::Any))
        | EventKind::Modify(ModifyKind::Name(RenameMode::Other)) => event
            .paths
            .iter()
            .zip(relative)
            .filter_map(|(path, relative)| {
                let relative = relative?;
                Some(if path.exists() {
                    VaultEvent::Created(relative)
                } else {
                    VaultEvent::Deleted(relative)
                })
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::DataChange;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn vault() -> DiskVault {
        DiskVault::new("/vault")
    }

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        paths
            .iter()
            .fold(Event::new(kind), |e, p| e.add_path(PathBuf::from(p)))
    }

    #[test]
    fn test_create_becomes_created() {
        let e = event(EventKind::Create(CreateKind::File), &["/vault/A/b.md"]);
        assert_eq!(translate(&vault(), &e), vec![VaultEvent::Created("A/b.md".into())]);
    }

    #[test]
    fn test_remove_becomes_deleted() {
        let e = event(EventKind::Remove(RemoveKind::File), &["/vault/A/b.md"]);
        assert_eq!(translate(&vault(), &e), vec![VaultEvent::Deleted("A/b.md".into())]);
    }

    #[test]
    fn test_rename_both_becomes_renamed() {
        let e = event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/vault/a.md", "/vault/B/a.md"],
        );
        assert_eq!(
            translate(&vault(), &e),
            vec![VaultEvent::Renamed {
                from: "a.md".into(),
                to: "B/a.md".into()
            }]
        );
    }

    #[test]
    fn test_unpaired_rename_checks_presence() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("B")).unwrap();
        std::fs::write(dir.path().join("B/a.md"), "A").unwrap();
        let vault = DiskVault::new(dir.path());
        let kind = EventKind::Modify(ModifyKind::Name(RenameMode::Any));

        let arrived = Event::new(kind).add_path(dir.path().join("B/a.md"));
        assert_eq!(translate(&vault, &arrived), vec![VaultEvent::Created("B/a.md".into())]);

        let left = Event::new(kind).add_path(dir.path().join("a.md"));
        assert_eq!(translate(&vault, &left), vec![VaultEvent::Deleted("a.md".into())]);
    }

    #[test]
    fn test_content_changes_are_ignored() {
        let e = event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/vault/a.md"],
        );
        assert!(translate(&vault(), &e).is_empty());
    }

    #[test]
    fn test_hidden_and_outside_paths_are_ignored() {
        let e = event(
            EventKind::Create(CreateKind::File),
            &["/vault/.backlinks/plugins/data.json", "/tmp/other.md"],
        );
        assert!(translate(&vault(), &e).is_empty());
    }
}

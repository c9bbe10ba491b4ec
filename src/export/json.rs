//! JSON backup of the deck: every item with its schedule state.

use crate::database::{SqliteStore, StateStore};
use crate::error::{Result, StoreError};
use crate::models::{LearningItem, ScheduleState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

pub const BACKUP_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub entries: Vec<BackupEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub item: LearningItem,
    pub state: ScheduleState,
}

/// Snapshots all items and states from the store.
pub fn create_backup(store: &SqliteStore, exported_at: DateTime<Utc>) -> Result<Backup> {
    let mut states: HashMap<i64, ScheduleState> = store
        .load_all_states()?
        .into_iter()
        .map(|s| (s.item_id, s))
        .collect();

    let entries = store
        .all_items()?
        .into_iter()
        .filter_map(|item| states.remove(&item.id).map(|state| BackupEntry { item, state }))
        .collect();

    Ok(Backup {
        version: BACKUP_VERSION,
        exported_at,
        entries,
    })
}

/// Writes every entry back into the store, overwriting existing ids.
/// Either the whole backup is restored or the store is left as it was.
/// Returns the number of entries restored.
pub fn restore_backup(store: &SqliteStore, backup: &Backup) -> Result<usize> {
    let restored = store.upsert_all(backup.entries.iter().map(|e| (&e.item, &e.state)))?;
    info!(entries = restored, "Backup restored");
    Ok(restored)
}

pub fn export_backup_to_path(backup: &Backup, path: &Path) -> Result<(), StoreError> {
    let json_string = serde_json::to_string_pretty(backup)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    info!(path = %path.display(), entries = backup.entries.len(), "Backup exported");
    Ok(())
}

pub fn import_backup(path: &Path) -> Result<Backup, StoreError> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let backup: Backup = serde_json::from_str(&contents)?;
    Ok(backup)
}

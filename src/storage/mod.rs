//! Persistence boundary: a small key-value store holding JSON records.
//!
//! This module provides:
//! - The `KeyValueStore` trait the scoreboard flushes to
//! - `MemoryStore`, with an optional byte quota (browser-storage style)
//! - `FileStore`, one JSON file per key in a data directory
//! - The record layout and keys used by the scoreboard

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use crate::logic::PlayerTotals;
use crate::models::{Match, ScoreError, Settings, TournamentHistoryEntry};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Namespace prefix for every key.
pub const NAMESPACE: &str = "smash_night";
/// Matches, stats, tournament history and settings.
pub const DATA_KEY: &str = "smash_night_data";
/// Player list without portraits.
pub const PLAYERS_KEY: &str = "smash_night_players";
/// Portraits by player id, kept apart so large images cannot break the player save.
pub const IMAGES_KEY: &str = "smash_night_player_images";
/// Sticky casual-mode VIP.
pub const CASUAL_VIP_KEY: &str = "smash_night_casual_vip";
/// Current tournament state.
pub const TOURNAMENT_KEY: &str = "smash_night_tournament";

/// Errors that can occur during storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// Write would exceed the store's byte quota.
    QuotaExceeded { needed: usize, quota: usize },
    /// Filesystem error.
    Io(std::io::Error),
    /// Could not determine data directory.
    NoDataDirectory,
    /// Value could not be serialized.
    Serialize(serde_json::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::QuotaExceeded { needed, quota } => {
                write!(f, "storage quota exceeded ({} bytes needed, {} allowed)", needed, quota)
            }
            StorageError::Io(e) => write!(f, "io error: {}", e),
            StorageError::NoDataDirectory => write!(f, "could not determine data directory"),
            StorageError::Serialize(e) => write!(f, "serialization error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialize(e)
    }
}

impl From<StorageError> for ScoreError {
    fn from(e: StorageError) -> Self {
        ScoreError::StorageWriteFailure(e.to_string())
    }
}

/// String key-value store. Writes replace the whole value for a key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// The main persisted record, also the import/export format.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataRecord {
    pub matches: Vec<Match>,
    pub stats: Vec<PlayerTotals>,
    #[serde(default)]
    pub tournament_history: Vec<TournamentHistoryEntry>,
    #[serde(default)]
    pub settings: Settings,
}

/// Read and parse a JSON value. Missing keys give None; malformed JSON is
/// logged and also gives None so callers fall back to defaults.
pub fn load_json<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("Ignoring malformed data under '{}': {}", key, e);
            None
        }
    }
}

/// Serialize and write a JSON value.
pub fn save_json<T: Serialize>(
    store: &mut impl KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use snafu::ResultExt;
use tempfile::NamedTempFile;

use crate::error::{CorruptSnafu, Result, StorageIoSnafu};
use crate::stats::PlayerStats;
use crate::word_state::WordState;

pub const WORD_STATES_KEY: &str = "wordStates";
pub const PLAYER_STATS_KEY: &str = "playerStats";

/// Persisted `wordStates` record: term -> state.
pub type WordStates = BTreeMap<String, WordState>;

/// Key/value hooks the scheduler persists through. Values are JSON documents.
pub trait Storage {
    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.records.insert(key.into(), value.into());
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        self.records.insert(key.to_owned(), value.to_owned());
        Ok(())
    }
}

/// Stores each record as `<dir>/<key>.json`. Writes go to a temp file in the same
/// directory which is then renamed over the target.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).context(StorageIoSnafu { key }),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let write = || -> io::Result<()> {
            fs::create_dir_all(&self.dir)?;
            let mut temp_file = NamedTempFile::new_in(&self.dir)?;
            temp_file.write_all(value.as_bytes())?;
            temp_file.as_file().sync_all()?;
            temp_file.persist(self.path(key))?;
            Ok(())
        };
        write().context(StorageIoSnafu { key })
    }
}

/// Reads and decodes one record. Missing records decode to `None`.
pub fn load_record<T: DeserializeOwned>(storage: &impl Storage, key: &str) -> Result<Option<T>> {
    let Some(text) = storage.read(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&text)
        .map(Some)
        .context(CorruptSnafu { key })
}

pub fn save_record<T: Serialize>(storage: &mut impl Storage, key: &str, value: &T) -> Result<()> {
    let text = serde_json::to_string(value).context(CorruptSnafu { key })?;
    storage.write(key, &text)
}

/// Loads both records, substituting defaults for anything missing or unreadable.
/// Word states outside their valid ranges are dropped so they start over as new words.
pub fn load_or_default(storage: &impl Storage) -> (WordStates, PlayerStats) {
    let mut word_states: Option<WordStates> =
        load_record(storage, WORD_STATES_KEY).unwrap_or_else(|e| {
            log::warn!("discarding stored word states: {e}");
            None
        });
    if let Some(states) = &mut word_states {
        states.retain(|term, state| {
            let valid = state.is_valid();
            if !valid {
                log::warn!("discarding out-of-range state for {term}: {state:?}");
            }
            valid
        });
    }
    let stats = load_record(storage, PLAYER_STATS_KEY).unwrap_or_else(|e| {
        log::warn!("discarding stored player stats: {e}");
        None
    });
    (word_states.unwrap_or_default(), stats.unwrap_or_default())
}

//! User settings persistence.
//!
//! Settings are a flat string key/value map. The store is injected
//! everywhere it is needed rather than living in a global, and the
//! file-backed implementation is fault tolerant: a missing or corrupt file
//! starts empty with a log line rather than failing startup.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use log::{error, warn};
use mockall::automock;
use thiserror::Error;

use crate::prayer::Coordinates;

/// Setting keys, matching the persisted record names of the original data.
pub mod keys {
    pub const LATITUDE: &str = "lat";
    pub const LONGITUDE: &str = "lon";
    pub const ADHAN_URI: &str = "adhanUri";
    pub const BREAK_START_URI: &str = "breakStartUri";
    pub const BREAK_END_URI: &str = "breakEndUri";
    pub const BREAKS_JSON: &str = "breaks_json";
}

/// Fallback coordinates (Ad-Dawadmi) used when no location was ever saved.
pub const DEFAULT_LATITUDE: f64 = 24.5077;
pub const DEFAULT_LONGITUDE: f64 = 44.3924;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to serialize store contents: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write store file: {0}")]
    Io(#[from] std::io::Error),
}

/// String key/value store with explicit read/write contracts.
///
/// Reads are infallible (`None` for an absent key); writes surface their
/// failure so interactive callers can report it.
#[automock]
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

/// JSON-file backed [`SettingsStore`].
///
/// The whole map is rewritten on each `set`; settings writes are rare
/// (user edits only), so simplicity wins over incremental updates.
pub struct FileSettingsStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileSettingsStore {
    /// Opens the store at `path`, loading existing values leniently.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(serialized) => match serde_json::from_str(&serialized) {
                Ok(values) => values,
                Err(e) => {
                    error!("failed to deserialize settings, starting empty: {}", e);
                    HashMap::new()
                }
            },
            Err(_) => {
                warn!("no persisted settings found, starting empty");
                HashMap::new()
            }
        };
        FileSettingsStore {
            path,
            values: Mutex::new(values),
        }
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().expect("settings lock poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut values = self.values.lock().expect("settings lock poisoned");
        values.insert(key.to_string(), value.to_string());
        let serialized = serde_json::to_string(&*values)?;
        fs::write(&self.path, serialized)?;
        Ok(())
    }
}

/// Typed view over the raw settings store.
#[derive(Clone)]
pub struct Settings {
    store: Arc<dyn SettingsStore>,
}

impl Settings {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Settings { store }
    }

    /// Saved location, or the documented Ad-Dawadmi fallback when no
    /// coordinate was ever saved or the saved value does not parse.
    pub fn coordinates(&self) -> Coordinates {
        let latitude = self
            .parse_f64(keys::LATITUDE)
            .unwrap_or(DEFAULT_LATITUDE);
        let longitude = self
            .parse_f64(keys::LONGITUDE)
            .unwrap_or(DEFAULT_LONGITUDE);
        Coordinates {
            latitude,
            longitude,
        }
    }

    pub fn set_coordinates(&self, coordinates: Coordinates) -> Result<(), StoreError> {
        self.store
            .set(keys::LATITUDE, &coordinates.latitude.to_string())?;
        self.store
            .set(keys::LONGITUDE, &coordinates.longitude.to_string())
    }

    /// Configured adhan sound, empty string meaning "unset".
    pub fn adhan_uri(&self) -> Option<String> {
        self.non_empty(keys::ADHAN_URI)
    }

    /// Global fallback sound for break starts.
    pub fn break_start_uri(&self) -> Option<String> {
        self.non_empty(keys::BREAK_START_URI)
    }

    /// Global fallback sound for break ends.
    pub fn break_end_uri(&self) -> Option<String> {
        self.non_empty(keys::BREAK_END_URI)
    }

    pub fn store(&self) -> Arc<dyn SettingsStore> {
        Arc::clone(&self.store)
    }

    fn non_empty(&self, key: &str) -> Option<String> {
        self.store.get(key).filter(|value| !value.is_empty())
    }

    fn parse_f64(&self, key: &str) -> Option<f64> {
        let raw = self.store.get(key)?;
        match raw.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                warn!("setting {} has non-numeric value {:?}, using default", key, raw);
                None
            }
        }
    }
}

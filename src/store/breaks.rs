//! Break definitions.
//!
//! Breaks live as a JSON array under a single settings key. Decoding is
//! element-wise: one malformed entry is skipped with a log line and the rest
//! of the list survives, so a partially corrupted value never wipes the
//! user's breaks.

use std::sync::Arc;

use chrono::NaiveTime;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::store::settings::{keys, SettingsStore, StoreError};

/// A recurring daily break window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakDefinition {
    pub id: String,
    #[serde(default = "default_name")]
    pub name: String,
    /// Daily wall-clock start in the configured timezone.
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    /// Length in minutes, always at least one.
    #[serde(default = "default_duration")]
    pub duration: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Per-break start sound, `None` meaning "use the global setting".
    #[serde(rename = "startUri", default, with = "opt_uri")]
    pub start_uri: Option<String>,
    #[serde(rename = "endUri", default, with = "opt_uri")]
    pub end_uri: Option<String>,
}

fn default_name() -> String {
    "Break".to_string()
}

fn default_duration() -> u32 {
    10
}

fn default_enabled() -> bool {
    true
}

/// `NaiveTime` as the stored "HH:MM" form.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// Optional URI where the stored empty string also means "unset".
mod opt_uri {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        uri: &Option<String>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(uri.as_deref().unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<String>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.filter(|uri| !uri.is_empty()))
    }
}

/// Reads and writes the break list stored in settings.
#[derive(Clone)]
pub struct BreakStore {
    store: Arc<dyn SettingsStore>,
}

impl BreakStore {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        BreakStore { store }
    }

    /// All decodable break definitions, in stored order.
    ///
    /// Entries that fail to decode or carry a zero duration are skipped
    /// individually.
    pub fn list(&self) -> Vec<BreakDefinition> {
        let Some(serialized) = self.store.get(keys::BREAKS_JSON) else {
            return Vec::new();
        };

        let entries: Vec<serde_json::Value> = match serde_json::from_str(&serialized) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("break list is not a JSON array, ignoring it: {}", e);
                return Vec::new();
            }
        };

        entries
            .into_iter()
            .filter_map(|entry| match serde_json::from_value(entry) {
                Ok(definition) => Some(definition),
                Err(e) => {
                    warn!("skipping undecodable break entry: {}", e);
                    None
                }
            })
            .filter(|definition: &BreakDefinition| {
                if definition.duration == 0 {
                    warn!("skipping break {} with zero duration", definition.id);
                    return false;
                }
                true
            })
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<BreakDefinition> {
        self.list().into_iter().find(|definition| definition.id == id)
    }

    /// Inserts `definition`, replacing any existing break with the same id.
    pub fn upsert(&self, definition: BreakDefinition) -> Result<(), StoreError> {
        let mut definitions = self.list();
        match definitions.iter_mut().find(|d| d.id == definition.id) {
            Some(existing) => *existing = definition,
            None => definitions.push(definition),
        }
        self.save(&definitions)
    }

    pub fn remove(&self, id: &str) -> Result<(), StoreError> {
        let definitions: Vec<_> = self
            .list()
            .into_iter()
            .filter(|definition| definition.id != id)
            .collect();
        self.save(&definitions)
    }

    fn save(&self, definitions: &[BreakDefinition]) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(definitions)?;
        self.store.set(keys::BREAKS_JSON, &serialized)
    }
}

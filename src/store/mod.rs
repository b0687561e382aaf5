//! Persistence: user settings and break definitions.
//!
//! Both stores share one injected [`settings::SettingsStore`], a flat string
//! key/value map. Break definitions are a JSON array stored under a single
//! key of that map, decoded element-wise so partial corruption never wipes
//! the whole list.

pub mod breaks;
pub mod settings;

//! Configuration file structures for the azanbreak daemon.
//!
//! Configuration is YAML with environment variable overrides. Every field
//! has a default, so an empty (or missing) file runs the daemon with Umm
//! al-Qura times for the Riyadh timezone.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # IANA timezone used to resolve daily wall-clock triggers
//! timezone: "Asia/Riyadh"
//!
//! prayer:
//!   # Calculation convention: umm_al_qura, muslim_world_league,
//!   # egyptian or karachi
//!   method: "umm_al_qura"
//!
//!   # Asr school: shafi or hanafi
//!   school: "shafi"
//! ```
//!
//! # Environment Variable Overrides
//!
//! Any value can be overridden with an `AZANBREAK_` prefixed variable,
//! using `__` as the section separator:
//!
//! ```bash
//! export AZANBREAK_TIMEZONE="Europe/Paris"
//! export AZANBREAK_PRAYER__METHOD="muslim_world_league"
//! ```

use chrono_tz::Tz;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::Deserialize;

use crate::prayer::{CalculationMethod, School};

/// Root configuration for the daemon.
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Timezone in which daily triggers are interpreted.
    #[serde(default = "default_timezone")]
    pub timezone: Tz,
    /// Prayer time computation settings.
    #[serde(default)]
    pub prayer: PrayerConfig,
}

/// Prayer time computation settings.
#[derive(Debug, Default, Deserialize)]
pub struct PrayerConfig {
    /// Twilight convention for fajr and isha.
    #[serde(default)]
    pub method: CalculationMethod,
    /// Asr shadow-factor school.
    #[serde(default)]
    pub school: School,
}

fn default_timezone() -> Tz {
    chrono_tz::Asia::Riyadh
}

impl Default for Config {
    fn default() -> Self {
        Config {
            timezone: default_timezone(),
            prayer: PrayerConfig::default(),
        }
    }
}

impl Config {
    /// Loads the YAML file at `path`, then applies `AZANBREAK_` environment
    /// overrides on top.
    pub fn load(path: &str) -> Result<Config, figment::Error> {
        Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed("AZANBREAK_").split("__"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    #[serial]
    fn test_missing_file_yields_defaults() {
        let config = Config::load("does-not-exist.yaml").unwrap();
        assert_eq!(config.timezone, chrono_tz::Asia::Riyadh);
        assert_eq!(config.prayer.method, CalculationMethod::UmmAlQura);
        assert_eq!(config.prayer.school, School::Shafi);
    }

    #[test]
    #[serial]
    fn test_full_file_overrides_defaults() {
        let file = write_config(
            "timezone: \"Europe/Paris\"\nprayer:\n  method: \"karachi\"\n  school: \"hanafi\"\n",
        );

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.timezone, chrono_tz::Europe::Paris);
        assert_eq!(config.prayer.method, CalculationMethod::Karachi);
        assert_eq!(config.prayer.school, School::Hanafi);
    }

    #[test]
    #[serial]
    fn test_partial_file_keeps_remaining_defaults() {
        let file = write_config("prayer:\n  school: \"hanafi\"\n");

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.timezone, chrono_tz::Asia::Riyadh);
        assert_eq!(config.prayer.method, CalculationMethod::UmmAlQura);
        assert_eq!(config.prayer.school, School::Hanafi);
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let file = write_config("timezone: \"Asia/Riyadh\"\n");

        unsafe {
            std::env::set_var("AZANBREAK_TIMEZONE", "Africa/Cairo");
            std::env::set_var("AZANBREAK_PRAYER__METHOD", "egyptian");
        }
        let config = Config::load(file.path().to_str().unwrap());
        unsafe {
            std::env::remove_var("AZANBREAK_TIMEZONE");
            std::env::remove_var("AZANBREAK_PRAYER__METHOD");
        }

        let config = config.unwrap();
        assert_eq!(config.timezone, chrono_tz::Africa::Cairo);
        assert_eq!(config.prayer.method, CalculationMethod::Egyptian);
    }

    #[test]
    #[serial]
    fn test_invalid_timezone_is_an_error() {
        let file = write_config("timezone: \"Mars/Olympus\"\n");
        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }
}

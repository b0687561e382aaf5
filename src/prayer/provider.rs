//! Prayer time provider boundary.
//!
//! The astronomical computation is consumed as a pure function of date,
//! location and configuration: given the same inputs it always returns the
//! same schedule, so schedules are recomputed on demand and never persisted.

use chrono::{DateTime, NaiveDate, Utc};
use mockall::automock;
use thiserror::Error;

/// A geographic position. Range validation happens at the provider boundary,
/// not at construction: out-of-range values degrade to the inline
/// "calculation error" state instead of crashing the caller.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// The named daily instants, in chronological order.
///
/// Sunrise is part of the schedule for display and logging but is not an
/// alert: only the five prayers are ever armed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Prayer {
    Fajr,
    Sunrise,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Prayer; 6] = [
        Prayer::Fajr,
        Prayer::Sunrise,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    /// Stable name used in trigger payloads and deduplication keys.
    pub fn wire_name(self) -> &'static str {
        match self {
            Prayer::Fajr => "fajr",
            Prayer::Sunrise => "sunrise",
            Prayer::Dhuhr => "dhuhr",
            Prayer::Asr => "asr",
            Prayer::Maghrib => "maghrib",
            Prayer::Isha => "isha",
        }
    }

    /// Whether this instant gets an adhan alert.
    pub fn is_alert(self) -> bool {
        !matches!(self, Prayer::Sunrise)
    }
}

/// One day's computed instants for a single location.
#[derive(Clone, Debug, PartialEq)]
pub struct PrayerSchedule {
    date: NaiveDate,
    entries: Vec<(Prayer, DateTime<Utc>)>,
}

impl PrayerSchedule {
    pub fn new(date: NaiveDate, entries: Vec<(Prayer, DateTime<Utc>)>) -> Self {
        PrayerSchedule { date, entries }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_of(&self, prayer: Prayer) -> Option<DateTime<Utc>> {
        self.entries
            .iter()
            .find(|(p, _)| *p == prayer)
            .map(|(_, t)| *t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Prayer, DateTime<Utc>)> + '_ {
        self.entries.iter().copied()
    }

    /// The instants that get an alert armed (everything except sunrise).
    pub fn alerts(&self) -> impl Iterator<Item = (Prayer, DateTime<Utc>)> + '_ {
        self.iter().filter(|(p, _)| p.is_alert())
    }
}

#[derive(Clone, Debug, Error, PartialEq)]
pub enum PrayerError {
    #[error("coordinates out of range: lat {latitude}, lon {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
    /// The sun never reaches the required altitude on this date at this
    /// location (polar day or night).
    #[error("prayer times are undefined for this date and location")]
    Undefined,
}

/// Computes the daily schedule for a date and location.
#[automock]
pub trait PrayerTimeProvider: Send + Sync {
    fn times_for(
        &self,
        date: NaiveDate,
        coordinates: Coordinates,
    ) -> Result<PrayerSchedule, PrayerError>;
}

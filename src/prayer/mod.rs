//! Prayer time computation.
//!
//! - [`PrayerTimeProvider`]: the capability the scheduler consumes
//! - [`SolarProvider`]: the production implementation, pure solar geometry
//! - [`PrayerSchedule`]: one day's computed instants, with sunrise carried
//!   for display but never armed

mod provider;
mod solar;

pub use crate::prayer::provider::{
    Coordinates, Prayer, PrayerError, PrayerSchedule, PrayerTimeProvider,
};
pub use crate::prayer::solar::{CalculationMethod, School, SolarProvider};

#[cfg(test)]
pub use crate::prayer::provider::MockPrayerTimeProvider;

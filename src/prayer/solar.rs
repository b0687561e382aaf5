//! Solar position prayer time computation.
//!
//! Standard NOAA-style solar geometry: fractional-year based equation of
//! time and declination, then hour angles for the altitudes each prayer is
//! defined by. Accurate to within a couple of minutes, which is well inside
//! the delivery slack the scheduler already tolerates.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::prayer::provider::{
    Coordinates, Prayer, PrayerError, PrayerSchedule, PrayerTimeProvider,
};

/// Convention used for the twilight prayers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationMethod {
    /// Umm al-Qura (Makkah): fajr at 18.5 degrees, isha 90 minutes after
    /// maghrib.
    #[default]
    UmmAlQura,
    MuslimWorldLeague,
    Egyptian,
    Karachi,
}

impl CalculationMethod {
    fn fajr_angle(self) -> f64 {
        match self {
            CalculationMethod::UmmAlQura => 18.5,
            CalculationMethod::MuslimWorldLeague => 18.0,
            CalculationMethod::Egyptian => 19.5,
            CalculationMethod::Karachi => 18.0,
        }
    }

    fn isha_rule(self) -> IshaRule {
        match self {
            CalculationMethod::UmmAlQura => IshaRule::MinutesAfterMaghrib(90),
            CalculationMethod::MuslimWorldLeague => IshaRule::Angle(17.0),
            CalculationMethod::Egyptian => IshaRule::Angle(17.5),
            CalculationMethod::Karachi => IshaRule::Angle(18.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum IshaRule {
    Angle(f64),
    MinutesAfterMaghrib(i64),
}

/// Jurisprudence school, which fixes the asr shadow factor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum School {
    #[default]
    Shafi,
    Hanafi,
}

impl School {
    fn shadow_factor(self) -> f64 {
        match self {
            School::Shafi => 1.0,
            School::Hanafi => 2.0,
        }
    }
}

/// Altitude of the sun's centre at apparent sunrise/sunset, accounting for
/// refraction and the solar radius.
const HORIZON_ALTITUDE: f64 = -0.833;

#[derive(Clone, Copy, Debug)]
enum Horizon {
    Rising,
    Setting,
}

/// Production [`PrayerTimeProvider`] computing times from solar geometry.
#[derive(Clone, Copy, Debug)]
pub struct SolarProvider {
    method: CalculationMethod,
    school: School,
}

impl SolarProvider {
    pub fn new(method: CalculationMethod, school: School) -> Self {
        SolarProvider { method, school }
    }
}

impl PrayerTimeProvider for SolarProvider {
    fn times_for(
        &self,
        date: NaiveDate,
        coordinates: Coordinates,
    ) -> Result<PrayerSchedule, PrayerError> {
        if !(-90.0..=90.0).contains(&coordinates.latitude)
            || !(-180.0..=180.0).contains(&coordinates.longitude)
        {
            return Err(PrayerError::InvalidCoordinates {
                latitude: coordinates.latitude,
                longitude: coordinates.longitude,
            });
        }

        let day = SolarDay::new(date, coordinates);

        let sunrise = day.time_at_altitude(HORIZON_ALTITUDE, Horizon::Rising)?;
        let maghrib = day.time_at_altitude(HORIZON_ALTITUDE, Horizon::Setting)?;
        let fajr = day.time_at_altitude(-self.method.fajr_angle(), Horizon::Rising)?;
        let isha = match self.method.isha_rule() {
            IshaRule::Angle(angle) => day.time_at_altitude(-angle, Horizon::Setting)?,
            IshaRule::MinutesAfterMaghrib(minutes) => maghrib + TimeDelta::minutes(minutes),
        };
        let asr_altitude = day.asr_altitude(self.school.shadow_factor());
        let asr = day.time_at_altitude(asr_altitude, Horizon::Setting)?;

        Ok(PrayerSchedule::new(
            date,
            vec![
                (Prayer::Fajr, fajr),
                (Prayer::Sunrise, sunrise),
                (Prayer::Dhuhr, day.solar_noon()),
                (Prayer::Asr, asr),
                (Prayer::Maghrib, maghrib),
                (Prayer::Isha, isha),
            ],
        ))
    }
}

/// Per-day solar constants for one location.
struct SolarDay {
    date: NaiveDate,
    latitude_rad: f64,
    longitude: f64,
    declination_rad: f64,
    equation_of_time_min: f64,
}

impl SolarDay {
    fn new(date: NaiveDate, coordinates: Coordinates) -> Self {
        // Fractional year at mid-day, in radians.
        let gamma =
            2.0 * std::f64::consts::PI / 365.0 * (date.ordinal() as f64 - 1.0 + 0.5);

        let equation_of_time_min = 229.18
            * (0.000075 + 0.001868 * gamma.cos()
                - 0.032077 * gamma.sin()
                - 0.014615 * (2.0 * gamma).cos()
                - 0.040849 * (2.0 * gamma).sin());

        let declination_rad = 0.006918 - 0.399912 * gamma.cos() + 0.070257 * gamma.sin()
            - 0.006758 * (2.0 * gamma).cos()
            + 0.000907 * (2.0 * gamma).sin()
            - 0.002697 * (3.0 * gamma).cos()
            + 0.00148 * (3.0 * gamma).sin();

        SolarDay {
            date,
            latitude_rad: coordinates.latitude.to_radians(),
            longitude: coordinates.longitude,
            declination_rad,
            equation_of_time_min,
        }
    }

    /// Minutes after 00:00 UTC of apparent solar noon.
    fn solar_noon_min(&self) -> f64 {
        720.0 - 4.0 * self.longitude - self.equation_of_time_min
    }

    fn solar_noon(&self) -> DateTime<Utc> {
        self.at_minutes(self.solar_noon_min())
    }

    /// Minutes between solar noon and the instant the sun's centre crosses
    /// `altitude_deg`, or an error when it never does on this date.
    fn hour_angle_min(&self, altitude_deg: f64) -> Result<f64, PrayerError> {
        let altitude = altitude_deg.to_radians();
        let cos_hour_angle = (altitude.sin()
            - self.latitude_rad.sin() * self.declination_rad.sin())
            / (self.latitude_rad.cos() * self.declination_rad.cos());

        if !cos_hour_angle.is_finite() || !(-1.0..=1.0).contains(&cos_hour_angle) {
            return Err(PrayerError::Undefined);
        }
        Ok(cos_hour_angle.acos().to_degrees() * 4.0)
    }

    fn time_at_altitude(
        &self,
        altitude_deg: f64,
        horizon: Horizon,
    ) -> Result<DateTime<Utc>, PrayerError> {
        let offset = self.hour_angle_min(altitude_deg)?;
        let minutes = match horizon {
            Horizon::Rising => self.solar_noon_min() - offset,
            Horizon::Setting => self.solar_noon_min() + offset,
        };
        Ok(self.at_minutes(minutes))
    }

    /// Sun altitude at asr: when an object's shadow equals `shadow_factor`
    /// times its height plus its noon shadow.
    fn asr_altitude(&self, shadow_factor: f64) -> f64 {
        let noon_zenith = (self.latitude_rad - self.declination_rad).abs();
        (1.0 / (shadow_factor + noon_zenith.tan())).atan().to_degrees()
    }

    fn at_minutes(&self, minutes: f64) -> DateTime<Utc> {
        let midnight = self.date.and_time(NaiveTime::MIN).and_utc();
        midnight + TimeDelta::seconds((minutes * 60.0).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn riyadh() -> Coordinates {
        Coordinates {
            latitude: 24.5077,
            longitude: 44.3924,
        }
    }

    fn june_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    #[test]
    fn test_riyadh_times_are_ordered() {
        let provider = SolarProvider::new(CalculationMethod::UmmAlQura, School::Shafi);
        let schedule = provider.times_for(june_day(), riyadh()).unwrap();

        let times: Vec<_> = schedule.iter().map(|(_, t)| t).collect();
        for pair in times.windows(2) {
            assert!(pair[0] < pair[1], "expected {} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_riyadh_solar_noon_is_plausible() {
        let provider = SolarProvider::new(CalculationMethod::UmmAlQura, School::Shafi);
        let schedule = provider.times_for(june_day(), riyadh()).unwrap();

        // Longitude 44.39 east puts solar noon near 09:02 UTC.
        let dhuhr = schedule.time_of(Prayer::Dhuhr).unwrap();
        assert_eq!(dhuhr.hour(), 9);
    }

    #[test]
    fn test_umm_al_qura_isha_is_ninety_minutes_after_maghrib() {
        let provider = SolarProvider::new(CalculationMethod::UmmAlQura, School::Shafi);
        let schedule = provider.times_for(june_day(), riyadh()).unwrap();

        let maghrib = schedule.time_of(Prayer::Maghrib).unwrap();
        let isha = schedule.time_of(Prayer::Isha).unwrap();
        assert_eq!(isha - maghrib, TimeDelta::minutes(90));
    }

    #[test]
    fn test_angle_based_isha_differs_from_fixed_interval() {
        let fixed = SolarProvider::new(CalculationMethod::UmmAlQura, School::Shafi)
            .times_for(june_day(), riyadh())
            .unwrap();
        let angled = SolarProvider::new(CalculationMethod::MuslimWorldLeague, School::Shafi)
            .times_for(june_day(), riyadh())
            .unwrap();

        assert_ne!(
            fixed.time_of(Prayer::Isha),
            angled.time_of(Prayer::Isha)
        );
    }

    #[test]
    fn test_hanafi_asr_is_later_than_shafi() {
        let shafi = SolarProvider::new(CalculationMethod::UmmAlQura, School::Shafi)
            .times_for(june_day(), riyadh())
            .unwrap();
        let hanafi = SolarProvider::new(CalculationMethod::UmmAlQura, School::Hanafi)
            .times_for(june_day(), riyadh())
            .unwrap();

        assert!(hanafi.time_of(Prayer::Asr).unwrap() > shafi.time_of(Prayer::Asr).unwrap());
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected() {
        let provider = SolarProvider::new(CalculationMethod::UmmAlQura, School::Shafi);
        let result = provider.times_for(
            june_day(),
            Coordinates {
                latitude: 95.0,
                longitude: 44.0,
            },
        );
        assert!(matches!(
            result,
            Err(PrayerError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn test_polar_day_is_undefined() {
        let provider = SolarProvider::new(CalculationMethod::UmmAlQura, School::Shafi);
        // Tromsø at midsummer: the sun never sets.
        let result = provider.times_for(
            NaiveDate::from_ymd_opt(2025, 6, 21).unwrap(),
            Coordinates {
                latitude: 69.6,
                longitude: 18.9,
            },
        );
        assert_eq!(result, Err(PrayerError::Undefined));
    }
}

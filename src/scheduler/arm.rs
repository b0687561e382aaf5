//! Trigger arming: turns a wall-clock target into a named deferred job.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono::offset::LocalResult;
use chrono_tz::Tz;
use log::info;
use thiserror::Error;

use crate::scheduler::clock::Clock;
use crate::scheduler::deferred::DeferredScheduler;
use crate::scheduler::trigger::{TriggerEvent, TriggerTime};

#[derive(Debug, Error, PartialEq)]
pub enum ScheduleError {
    /// The configured zone has no mapping for this wall-clock time today
    /// (pathological DST gap that survives a one-hour shift).
    #[error("wall-clock time {time} cannot be resolved in the configured timezone")]
    UnresolvableLocalTime { time: NaiveTime },
}

/// Converts trigger targets into durable, de-duplicated deferred jobs.
///
/// The scheduler is pure translation: it persists nothing itself beyond what
/// the deferred facility persists, and everything needed to re-derive a
/// trigger lives in the settings and break stores.
pub struct TriggerScheduler<S: DeferredScheduler, C: Clock> {
    deferred: S,
    clock: C,
    timezone: Tz,
}

impl<S: DeferredScheduler, C: Clock> TriggerScheduler<S, C> {
    pub fn new(deferred: S, clock: C, timezone: Tz) -> Self {
        TriggerScheduler {
            deferred,
            clock,
            timezone,
        }
    }

    /// Arms `event` at `when` and returns the resolved target instant.
    ///
    /// Resolution rule: `delay = target - now`; if the target already passed,
    /// it is rolled forward by exactly 24 hours. This is the sole rollover
    /// rule; no DST-aware adjustment is performed. An absolute instant more
    /// than a day in the past ends up with a clamped zero delay and fires
    /// immediately.
    ///
    /// Submission is fire-and-forget: the deferred facility may delay or
    /// coalesce execution, and no synchronous delivery signal exists.
    pub async fn arm(
        &self,
        when: TriggerTime,
        event: TriggerEvent,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        let now = self.clock.now();
        let mut target = match when {
            TriggerTime::At(instant) => instant,
            TriggerTime::Daily(time) => self.resolve_daily(now, time)?,
        };

        let mut delay = target - now;
        if delay < TimeDelta::zero() {
            delay += TimeDelta::hours(24);
            target += TimeDelta::hours(24);
        }

        let name = event.unique_name(target.timestamp_millis());
        info!(
            "arming {} at {} (in {}s)",
            name,
            target,
            delay.num_seconds()
        );
        self.deferred
            .submit(&name, delay.to_std().unwrap_or_default(), event)
            .await;
        Ok(target)
    }

    /// Today's calendar date in the configured zone.
    pub fn local_today(&self) -> NaiveDate {
        self.clock.now().with_timezone(&self.timezone).date_naive()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    fn resolve_daily(
        &self,
        now: DateTime<Utc>,
        time: NaiveTime,
    ) -> Result<DateTime<Utc>, ScheduleError> {
        let today = now.with_timezone(&self.timezone).date_naive();
        let naive = today.and_time(time);
        match self.timezone.from_local_datetime(&naive) {
            LocalResult::Single(local) | LocalResult::Ambiguous(local, _) => {
                Ok(local.with_timezone(&Utc))
            }
            LocalResult::None => {
                // Spring-forward gap: the wall-clock minute does not exist
                // today, take the same minute one hour later.
                let shifted = naive + TimeDelta::hours(1);
                self.timezone
                    .from_local_datetime(&shifted)
                    .earliest()
                    .map(|local| local.with_timezone(&Utc))
                    .ok_or(ScheduleError::UnresolvableLocalTime { time })
            }
        }
    }
}

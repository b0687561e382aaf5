//! Boot and daily re-arming of every recurring trigger.
//!
//! Re-arming is best effort per trigger: one failing prayer computation or
//! one unresolvable break never stops the remaining triggers from being
//! armed. The report tells the caller what happened without making any of it
//! fatal.

use chrono::TimeDelta;
use log::{error, info, warn};

use crate::prayer::{PrayerError, PrayerTimeProvider};
use crate::scheduler::arm::TriggerScheduler;
use crate::scheduler::clock::Clock;
use crate::scheduler::deferred::DeferredScheduler;
use crate::scheduler::trigger::{TriggerEvent, TriggerTime};
use crate::store::breaks::BreakStore;
use crate::store::settings::Settings;

/// Outcome of one re-arm pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RearmReport {
    pub prayers_armed: usize,
    pub breaks_armed: usize,
    /// Why the prayer side produced nothing, when it did.
    pub prayer_error: Option<PrayerError>,
}

/// Re-arms all prayer alerts and all enabled break windows.
pub struct RearmCoordinator<'a, P, S, C>
where
    P: PrayerTimeProvider,
    S: DeferredScheduler,
    C: Clock,
{
    provider: &'a P,
    scheduler: &'a TriggerScheduler<S, C>,
    settings: &'a Settings,
    breaks: &'a BreakStore,
}

impl<'a, P, S, C> RearmCoordinator<'a, P, S, C>
where
    P: PrayerTimeProvider,
    S: DeferredScheduler,
    C: Clock,
{
    pub fn new(
        provider: &'a P,
        scheduler: &'a TriggerScheduler<S, C>,
        settings: &'a Settings,
        breaks: &'a BreakStore,
    ) -> Self {
        RearmCoordinator {
            provider,
            scheduler,
            settings,
            breaks,
        }
    }

    /// One full pass: today's prayer alerts, then every enabled break.
    ///
    /// Arming is idempotent thanks to name-based deduplication, so running
    /// this repeatedly (boot, midnight, after a settings change) is safe.
    pub async fn rearm_all(&self) -> RearmReport {
        let mut report = RearmReport::default();
        self.rearm_prayers(&mut report).await;
        self.rearm_breaks(&mut report).await;
        info!(
            "re-arm pass done: {} prayers, {} break triggers",
            report.prayers_armed, report.breaks_armed
        );
        report
    }

    async fn rearm_prayers(&self, report: &mut RearmReport) {
        let coordinates = self.settings.coordinates();
        let schedule = match self
            .provider
            .times_for(self.scheduler.local_today(), coordinates)
        {
            Ok(schedule) => schedule,
            Err(e) => {
                error!("prayer times unavailable, skipping prayer alerts: {}", e);
                report.prayer_error = Some(e);
                return;
            }
        };

        for (prayer, instant) in schedule.alerts() {
            let event = TriggerEvent::Prayer {
                pray: prayer.wire_name().to_string(),
            };
            match self.scheduler.arm(TriggerTime::At(instant), event).await {
                Ok(_) => report.prayers_armed += 1,
                Err(e) => warn!("failed to arm {}: {}", prayer.wire_name(), e),
            }
        }
    }

    async fn rearm_breaks(&self, report: &mut RearmReport) {
        for definition in self.breaks.list() {
            if !definition.enabled {
                continue;
            }

            let start = match self
                .scheduler
                .arm(
                    TriggerTime::Daily(definition.time),
                    TriggerEvent::BreakStart {
                        break_id: definition.id.clone(),
                    },
                )
                .await
            {
                Ok(start) => start,
                Err(e) => {
                    warn!("failed to arm start of break {}: {}", definition.id, e);
                    continue;
                }
            };
            report.breaks_armed += 1;

            // The end is anchored on the resolved start so the pair always
            // lands on the same day, even when the start rolled over.
            let end = start + TimeDelta::minutes(definition.duration as i64);
            match self
                .scheduler
                .arm(
                    TriggerTime::At(end),
                    TriggerEvent::BreakEnd {
                        break_id: definition.id.clone(),
                    },
                )
                .await
            {
                Ok(_) => report.breaks_armed += 1,
                Err(e) => warn!("failed to arm end of break {}: {}", definition.id, e),
            }
        }
    }
}

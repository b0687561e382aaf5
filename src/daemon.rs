//! Daemon wiring and lifecycle.
//!
//! The daemon owns the long-lived pieces (stores, scheduler, dispatcher) and
//! runs the recurring loop: recover persisted jobs, arm today's triggers,
//! then re-arm shortly after every local midnight so the next day's triggers
//! exist without waiting for a restart.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use log::{error, info, warn};
use tokio::{signal, time};

use crate::config::Config;
use crate::dispatch::{AlertDispatcher, LogAudioSink, LogNotifier};
use crate::prayer::SolarProvider;
use crate::scheduler::{
    FireHandler, RearmCoordinator, SystemClock, TokioDeferredScheduler, TriggerEvent,
    TriggerScheduler, TriggerTime,
};
use crate::store::breaks::BreakStore;
use crate::store::settings::{FileSettingsStore, Settings};

/// Seconds past local midnight at which the daily re-arm pass runs. The
/// margin keeps the pass clearly on the new calendar day.
const MIDNIGHT_MARGIN_SECS: i64 = 5;

/// The assembled daemon.
pub struct Daemon {
    deferred: Arc<TokioDeferredScheduler>,
    scheduler: TriggerScheduler<Arc<TokioDeferredScheduler>, SystemClock>,
    provider: SolarProvider,
    settings: Settings,
    breaks: BreakStore,
    timezone: Tz,
}

impl Daemon {
    /// Wires up stores, dispatcher and scheduler under `data_dir`.
    pub fn new(config: Config, data_dir: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(data_dir)?;

        let store = Arc::new(FileSettingsStore::open(data_dir.join("settings.json")));
        let settings = Settings::new(store.clone());
        let breaks = BreakStore::new(store);

        let dispatcher = AlertDispatcher::new(
            settings.clone(),
            breaks.clone(),
            Arc::new(LogAudioSink),
            Arc::new(LogNotifier),
        );
        let on_fire: FireHandler = Arc::new(move |event| dispatcher.handle(event));

        let deferred = Arc::new(TokioDeferredScheduler::new(
            data_dir.join("jobs.json"),
            on_fire,
        ));
        let scheduler =
            TriggerScheduler::new(Arc::clone(&deferred), SystemClock, config.timezone);
        let provider = SolarProvider::new(config.prayer.method, config.prayer.school);

        Ok(Daemon {
            deferred,
            scheduler,
            provider,
            settings,
            breaks,
            timezone: config.timezone,
        })
    }

    /// Runs until interrupted: recovery, the first arm pass, then the daily
    /// re-arm loop.
    pub async fn start(&self, test_adhan: bool) {
        self.deferred.recover().await;
        self.rearm().await;

        if test_adhan {
            let target = Utc::now() + TimeDelta::seconds(2);
            if let Err(e) = self
                .scheduler
                .arm(TriggerTime::At(target), TriggerEvent::TestAdhan)
                .await
            {
                warn!("failed to arm adhan test: {}", e);
            }
        }

        loop {
            let pause = until_next_rearm(Utc::now(), self.timezone);
            info!("next re-arm pass in {}s", pause.as_secs());
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!("shutting down");
                    break;
                }
                _ = time::sleep(pause) => {
                    self.rearm().await;
                }
            }
        }
    }

    async fn rearm(&self) {
        let report =
            RearmCoordinator::new(&self.provider, &self.scheduler, &self.settings, &self.breaks)
                .rearm_all()
                .await;
        if let Some(e) = report.prayer_error {
            error!("prayer alerts are inactive: {}", e);
        }
    }
}

/// Time until just past the next local midnight in `timezone`.
fn until_next_rearm(now: DateTime<Utc>, timezone: Tz) -> Duration {
    let local = now.with_timezone(&timezone);
    let next_midnight = local
        .date_naive()
        .succ_opt()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|naive| timezone.from_local_datetime(&naive).earliest());

    match next_midnight {
        Some(midnight) => {
            let wait = midnight.with_timezone(&Utc) - now + TimeDelta::seconds(MIDNIGHT_MARGIN_SECS);
            wait.to_std().unwrap_or(Duration::from_secs(60))
        }
        // Calendar edge (end of supported range): retry hourly.
        None => Duration::from_secs(3600),
    }
}

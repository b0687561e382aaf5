//! Durable deferred execution facility.
//!
//! This module provides the [`DeferredScheduler`] capability consumed by the
//! trigger scheduler, and its production implementation backed by tokio
//! timers plus a persisted job table. The job table is the durability
//! mechanism: every submission is recorded on disk before its timer starts,
//! and [`TokioDeferredScheduler::recover`] re-submits the surviving entries
//! at startup, so a process restart loses no armed trigger.
//!
//! Submission names drive replace-vs-duplicate semantics: a pending job with
//! the same name is aborted and replaced, never duplicated.

use std::{collections::HashMap, path::PathBuf, sync::Arc, time::Duration};

use chrono::Utc;
use log::{debug, error, info, warn};
use mockall::automock;
use serde::{Deserialize, Serialize};
use tokio::{fs, sync::Mutex, task::JoinHandle, time};

use crate::scheduler::trigger::TriggerEvent;

/// Callback invoked when a deferred job comes due.
///
/// Firing must never panic or block the host: the dispatcher behind this
/// callback swallows its own failures after best-effort fallback.
pub type FireHandler = Arc<dyn Fn(TriggerEvent) + Send + Sync>;

/// Capability to durably run an event later.
///
/// `name` drives deduplication: submitting twice under the same name leaves
/// exactly one pending request (replace semantics). Submission is
/// fire-and-forget; no synchronous success signal is returned.
#[automock]
pub trait DeferredScheduler {
    async fn submit(&self, name: &str, delay: Duration, event: TriggerEvent);
}

impl<T> DeferredScheduler for Arc<T>
where
    T: DeferredScheduler + Send + Sync,
{
    async fn submit(&self, name: &str, delay: Duration, event: TriggerEvent) {
        (**self).submit(name, delay, event).await;
    }
}

/// A job record as persisted in the on-disk table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct PersistedJob {
    /// Absolute due instant, milliseconds since the Unix epoch.
    due_ms: i64,
    event: TriggerEvent,
}

/// Loads and persists the job table file.
///
/// Fault tolerant in the same way the rest of the persistence layer is: a
/// missing or corrupt table yields an empty map with a log line, and write
/// failures are logged without propagating, so scheduling keeps working even
/// when the disk does not.
#[derive(Clone)]
struct JobTableLoader {
    path: PathBuf,
}

impl JobTableLoader {
    fn new(path: PathBuf) -> Self {
        JobTableLoader { path }
    }

    async fn load(&self) -> HashMap<String, PersistedJob> {
        let Ok(serialized) = fs::read_to_string(&self.path).await else {
            warn!("no persisted job table found, starting empty");
            return HashMap::new();
        };

        let Ok(table) = serde_json::from_str(&serialized) else {
            error!("failed to deserialize persisted job table, starting empty");
            return HashMap::new();
        };

        table
    }

    async fn persist(&self, table: &HashMap<String, PersistedJob>) {
        let serialized = match serde_json::to_string(table) {
            Ok(serialized) => serialized,
            Err(e) => {
                error!("failed to serialize job table: {}", e);
                return;
            }
        };

        if let Err(e) = fs::write(&self.path, &serialized).await {
            error!("failed to persist job table: {}", e);
        }
    }
}

/// Production deferred scheduler: tokio timers plus a durable job table.
pub struct TokioDeferredScheduler {
    /// Durable view of every pending job, mirrored to disk on each change.
    table: Arc<Mutex<HashMap<String, PersistedJob>>>,
    /// In-process timer handles, keyed by submission name for replacement.
    handles: Arc<Mutex<HashMap<String, JoinHandle<()>>>>,
    loader: JobTableLoader,
    on_fire: FireHandler,
}

impl TokioDeferredScheduler {
    /// Creates a scheduler persisting its job table at `path`.
    pub fn new(path: impl Into<PathBuf>, on_fire: FireHandler) -> Self {
        TokioDeferredScheduler {
            table: Arc::new(Mutex::new(HashMap::new())),
            handles: Arc::new(Mutex::new(HashMap::new())),
            loader: JobTableLoader::new(path.into()),
            on_fire,
        }
    }

    /// Recovery scan: reload the persisted table and re-submit every
    /// surviving job with its remaining delay.
    ///
    /// Jobs whose due instant already passed while the process was down fire
    /// immediately; delivery is coarse by design, a late alert beats a lost
    /// one.
    pub async fn recover(&self) {
        let persisted = self.loader.load().await;
        if persisted.is_empty() {
            return;
        }
        info!("recovering {} deferred jobs", persisted.len());

        {
            let mut table = self.table.lock().await;
            *table = persisted.clone();
        }

        let now_ms = Utc::now().timestamp_millis();
        for (name, job) in persisted {
            let remaining_ms = (job.due_ms - now_ms).max(0) as u64;
            self.spawn_job(name, Duration::from_millis(remaining_ms), job.event)
                .await;
        }
    }

    /// Number of jobs currently pending in the durable table.
    pub async fn pending(&self) -> usize {
        self.table.lock().await.len()
    }

    async fn spawn_job(&self, name: String, delay: Duration, event: TriggerEvent) {
        let table = Arc::clone(&self.table);
        let handles = Arc::clone(&self.handles);
        let loader = self.loader.clone();
        let on_fire = Arc::clone(&self.on_fire);
        let job_name = name.clone();

        let handle = tokio::spawn(async move {
            time::sleep(delay).await;

            // Clear the durable record before firing so a crash inside the
            // handler cannot replay an already-delivered alert on recovery.
            {
                let mut table = table.lock().await;
                table.remove(&job_name);
                loader.persist(&table).await;
            }
            handles.lock().await.remove(&job_name);

            debug!("deferred job {} is due", job_name);
            on_fire(event);
        });

        let mut handles = self.handles.lock().await;
        if let Some(previous) = handles.insert(name, handle) {
            previous.abort();
        }
    }
}

impl DeferredScheduler for TokioDeferredScheduler {
    async fn submit(&self, name: &str, delay: Duration, event: TriggerEvent) {
        let due_ms = Utc::now().timestamp_millis() + delay.as_millis() as i64;

        {
            let mut table = self.table.lock().await;
            table.insert(
                name.to_string(),
                PersistedJob {
                    due_ms,
                    event: event.clone(),
                },
            );
            self.loader.persist(&table).await;
        }

        self.spawn_job(name.to_string(), delay, event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::time::sleep;

    fn counting_handler() -> (FireHandler, Arc<AtomicUsize>) {
        let counter = Arc::new(AtomicUsize::new(0));
        let counter_clone = Arc::clone(&counter);
        let handler: FireHandler = Arc::new(move |_event| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });
        (handler, counter)
    }

    fn table_path(dir: &TempDir) -> PathBuf {
        dir.path().join("jobs.json")
    }

    #[tokio::test]
    async fn test_submit_fires_and_clears_table() {
        let dir = TempDir::new().unwrap();
        let (handler, counter) = counting_handler();
        let scheduler = TokioDeferredScheduler::new(table_path(&dir), handler);

        scheduler
            .submit("x1", Duration::from_millis(20), TriggerEvent::TestAdhan)
            .await;
        assert_eq!(scheduler.pending().await, 1);

        sleep(Duration::from_millis(150)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_name_replaces_pending_job() {
        let dir = TempDir::new().unwrap();
        let (handler, counter) = counting_handler();
        let scheduler = TokioDeferredScheduler::new(table_path(&dir), handler);

        let event = TriggerEvent::Prayer {
            pray: "fajr".to_string(),
        };
        scheduler
            .submit("prayfajr1000", Duration::from_millis(40), event.clone())
            .await;
        scheduler
            .submit("prayfajr1000", Duration::from_millis(40), event)
            .await;

        assert_eq!(scheduler.pending().await, 1);
        sleep(Duration::from_millis(200)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_distinct_names_both_fire() {
        let dir = TempDir::new().unwrap();
        let (handler, counter) = counting_handler();
        let scheduler = TokioDeferredScheduler::new(table_path(&dir), handler);

        scheduler
            .submit(
                "break_startb11000",
                Duration::from_millis(20),
                TriggerEvent::BreakStart {
                    break_id: "b1".to_string(),
                },
            )
            .await;
        scheduler
            .submit(
                "break_endb12000",
                Duration::from_millis(20),
                TriggerEvent::BreakEnd {
                    break_id: "b1".to_string(),
                },
            )
            .await;

        sleep(Duration::from_millis(150)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_recover_fires_past_due_job_immediately() {
        let dir = TempDir::new().unwrap();
        let path = table_path(&dir);

        // Persist a job whose due instant is already in the past, as if the
        // process died before it fired.
        let loader = JobTableLoader::new(path.clone());
        let mut table = HashMap::new();
        table.insert(
            "prayisha1".to_string(),
            PersistedJob {
                due_ms: Utc::now().timestamp_millis() - 60_000,
                event: TriggerEvent::Prayer {
                    pray: "isha".to_string(),
                },
            },
        );
        loader.persist(&table).await;

        let (handler, counter) = counting_handler();
        let scheduler = TokioDeferredScheduler::new(path, handler);
        scheduler.recover().await;

        sleep(Duration::from_millis(100)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending().await, 0);
    }

    #[tokio::test]
    async fn test_recover_waits_for_future_job() {
        let dir = TempDir::new().unwrap();
        let path = table_path(&dir);

        let loader = JobTableLoader::new(path.clone());
        let mut table = HashMap::new();
        table.insert(
            "test_adhan1".to_string(),
            PersistedJob {
                due_ms: Utc::now().timestamp_millis() + 80,
                event: TriggerEvent::TestAdhan,
            },
        );
        loader.persist(&table).await;

        let (handler, counter) = counting_handler();
        let scheduler = TokioDeferredScheduler::new(path, handler);
        scheduler.recover().await;

        // Not yet due.
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(250)).await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loader_missing_file_yields_empty_table() {
        let loader = JobTableLoader::new(PathBuf::from("nonexistent_jobs.json"));
        assert!(loader.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_loader_corrupt_file_yields_empty_table() {
        let dir = TempDir::new().unwrap();
        let path = table_path(&dir);
        fs::write(&path, "{ not json").await.unwrap();

        let loader = JobTableLoader::new(path);
        assert!(loader.load().await.is_empty());
    }

    #[tokio::test]
    async fn test_loader_round_trip() {
        let dir = TempDir::new().unwrap();
        let loader = JobTableLoader::new(table_path(&dir));

        let mut table = HashMap::new();
        table.insert(
            "break_startb19".to_string(),
            PersistedJob {
                due_ms: 9,
                event: TriggerEvent::BreakStart {
                    break_id: "b1".to_string(),
                },
            },
        );
        loader.persist(&table).await;

        assert_eq!(loader.load().await, table);
    }
}

//! Recurring cleanup sweep.
//!
//! Waits an initial delay after start, runs one sweep, then repeats on a
//! fixed interval. A failed sweep is logged and the timer keeps going.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{error, info};

use linkvault_core::config::SchedulerConfig;
use linkvault_core::types::CleanupResult;
use linkvault_storage::RetentionEngine;

/// Background task that drives `RetentionEngine::cleanup_expired_urls`.
pub struct CleanupScheduler {
    engine: Arc<RetentionEngine>,
    initial_delay: Duration,
    interval: Duration,
    shutdown: Arc<Notify>,
    completed_runs: AtomicU64,
    failed_runs: AtomicU64,
}

impl CleanupScheduler {
    pub fn new(engine: Arc<RetentionEngine>, initial_delay: Duration, interval: Duration) -> Self {
        Self {
            engine,
            initial_delay,
            interval,
            shutdown: Arc::new(Notify::new()),
            completed_runs: AtomicU64::new(0),
            failed_runs: AtomicU64::new(0),
        }
    }

    pub fn from_config(engine: Arc<RetentionEngine>, config: &SchedulerConfig) -> Self {
        Self::new(engine, config.initial_delay(), config.interval())
    }

    /// Run until `shutdown` is called.
    pub async fn run(&self) {
        info!(
            initial_delay_secs = self.initial_delay.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Cleanup scheduler started"
        );

        tokio::select! {
            _ = tokio::time::sleep(self.initial_delay) => {}
            _ = self.shutdown.notified() => return,
        }

        loop {
            self.run_once().await;

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.notified() => {
                    info!("Cleanup scheduler stopped");
                    return;
                }
            }
        }
    }

    /// Run a single sweep, logging instead of returning the error.
    pub async fn run_once(&self) -> Option<CleanupResult> {
        match self.engine.cleanup_expired_urls().await {
            Ok(result) => {
                self.completed_runs.fetch_add(1, Ordering::Relaxed);
                Some(result)
            }
            Err(e) => {
                self.failed_runs.fetch_add(1, Ordering::Relaxed);
                error!(error = %e, "Scheduled cleanup sweep failed");
                None
            }
        }
    }

    /// Signal the scheduler to stop. Safe to call before `run`.
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }

    pub fn completed_runs(&self) -> u64 {
        self.completed_runs.load(Ordering::Relaxed)
    }

    pub fn failed_runs(&self) -> u64 {
        self.failed_runs.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use linkvault_core::clock::ManualClock;
    use linkvault_core::error::LinkVaultError;
    use linkvault_core::policy::RetentionPolicy;
    use linkvault_core::types::{ShortLink, UserType};
    use linkvault_storage::{Database, LinkRepository};

    fn setup() -> (Arc<Database>, Arc<RetentionEngine>) {
        let db = Arc::new(Database::in_memory().unwrap());
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let links = LinkRepository::new(Arc::clone(&db));
        links
            .insert(&ShortLink::new(
                "stale",
                "https://example.com",
                UserType::Anonymous,
                now - ChronoDuration::days(120),
            ))
            .unwrap();
        let engine = RetentionEngine::with_database(
            Arc::clone(&db),
            Arc::new(ManualClock::new(now)),
            RetentionPolicy::default(),
        );
        (db, Arc::new(engine))
    }

    fn break_storage(db: &Database) {
        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE short_links")
                .map_err(|e| LinkVaultError::Storage(e.to_string()))
        })
        .unwrap();
    }

    #[tokio::test]
    async fn test_scheduler_shutdown_before_run() {
        let (_, engine) = setup();
        let scheduler = CleanupScheduler::new(engine, Duration::from_secs(3600), Duration::from_secs(3600));

        scheduler.shutdown();
        tokio::time::timeout(Duration::from_secs(2), scheduler.run())
            .await
            .expect("Scheduler should shut down within timeout");
        assert_eq!(scheduler.completed_runs(), 0);
    }

    #[tokio::test]
    async fn test_first_sweep_runs_after_initial_delay() {
        let (db, engine) = setup();
        let scheduler = Arc::new(CleanupScheduler::new(
            engine,
            Duration::from_millis(10),
            Duration::from_secs(3600),
        ));

        let handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.run().await }
        });

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(scheduler.completed_runs(), 1);
        assert_eq!(LinkRepository::new(db).count().unwrap(), 0);

        scheduler.shutdown();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("Scheduler should shut down within timeout")
            .unwrap();
    }

    #[tokio::test]
    async fn test_failed_sweeps_do_not_stop_the_timer() {
        let (db, engine) = setup();
        break_storage(&db);
        let scheduler = Arc::new(CleanupScheduler::new(
            engine,
            Duration::from_millis(1),
            Duration::from_millis(20),
        ));

        let handle = tokio::spawn({
            let scheduler = Arc::clone(&scheduler);
            async move { scheduler.run().await }
        });

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(scheduler.failed_runs() >= 2);
        assert_eq!(scheduler.completed_runs(), 0);
        assert!(!handle.is_finished());

        scheduler.shutdown();
        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("Scheduler should shut down within timeout")
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_once_reports_result() {
        let (_, engine) = setup();
        let scheduler = CleanupScheduler::from_config(engine, &SchedulerConfig::default());

        let result = scheduler.run_once().await.unwrap();
        assert_eq!(result.anonymous_deleted, 1);
        assert!(scheduler.run_once().await.is_some());
        assert_eq!(scheduler.completed_runs(), 2);
    }
}

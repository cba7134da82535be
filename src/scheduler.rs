//! Periodic batched refresh of every stored advisory
//!
//! Runs use fixed-delay semantics: the interval is measured from the end of
//! one run to the start of the next, so runs never overlap.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use chrono_tz::Tz;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::SchedulerConfig;
use crate::refresh::RefreshOrchestrator;
use crate::{AdvisoryError, Result};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);
const HEARTBEAT_INITIAL_DELAY: Duration = Duration::from_secs(10);
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f %z";

pub struct Scheduler {
    orchestrator: Arc<RefreshOrchestrator>,
    initial_delay: Duration,
    interval: Duration,
    batch_size: usize,
    concurrency: usize,
    timezone: Tz,
}

/// Tasks started by [`Scheduler::spawn`]
pub struct SchedulerHandle {
    refresh: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

impl SchedulerHandle {
    pub fn abort(&self) {
        self.refresh.abort();
        self.heartbeat.abort();
    }
}

impl Scheduler {
    pub fn new(orchestrator: Arc<RefreshOrchestrator>, config: &SchedulerConfig) -> Result<Self> {
        let timezone = config.timezone.parse::<Tz>().map_err(|_| {
            AdvisoryError::config(format!("Unknown scheduler timezone '{}'", config.timezone))
        })?;

        Ok(Self {
            orchestrator,
            initial_delay: Duration::from_secs(config.initial_delay_seconds),
            interval: Duration::from_secs(config.interval_seconds),
            batch_size: config.batch_size,
            concurrency: config.concurrency,
            timezone,
        })
    }

    /// Current time in the configured timezone, for log lines
    #[must_use]
    pub fn timestamp(&self) -> String {
        Utc::now()
            .with_timezone(&self.timezone)
            .format(TIMESTAMP_FORMAT)
            .to_string()
    }

    /// One batched refresh of every stored city; returns how many synced
    pub async fn run_once(&self) -> usize {
        info!("[SCHEDULER] Starting batch sync-all task at: {}", self.timestamp());

        let count = self
            .orchestrator
            .refresh_all_in_batches(self.batch_size, self.concurrency)
            .count()
            .await;

        info!(
            "[SCHEDULER] Successfully synced {} advisories in batches at: {}",
            count,
            self.timestamp()
        );
        count
    }

    pub fn spawn(self) -> SchedulerHandle {
        let scheduler = Arc::new(self);

        let heartbeat = {
            let scheduler = Arc::clone(&scheduler);
            tokio::spawn(async move {
                tokio::time::sleep(HEARTBEAT_INITIAL_DELAY).await;
                let mut ticker = tokio::time::interval(HEARTBEAT_INTERVAL);
                loop {
                    ticker.tick().await;
                    debug!(
                        "[SCHEDULER] Health check - Scheduler is active at: {}",
                        scheduler.timestamp()
                    );
                }
            })
        };

        let refresh = tokio::spawn(async move {
            info!(
                "[SCHEDULER] First run in {:?}, then every {:?} after each run",
                scheduler.initial_delay, scheduler.interval
            );
            tokio::time::sleep(scheduler.initial_delay).await;
            loop {
                scheduler.run_once().await;
                debug!("[SCHEDULER] Batch sync-all task completed at: {}", scheduler.timestamp());
                tokio::time::sleep(scheduler.interval).await;
            }
        });

        SchedulerHandle { refresh, heartbeat }
    }
}

// src/pipeline/schedule.rs

//! Periodic runs.
//!
//! Waits for the initial delay, then runs the engine on a fixed interval.
//! A tick that would start while a run is still in flight is dropped, so
//! at most one run is ever in progress.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};

use crate::models::{BatchStatus, ScheduleConfig};
use crate::pipeline::DiffEngine;
use crate::services::Notifier;

/// What happened on a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Run finished and its batch was handed to the notifier
    Completed(BatchStatus),
    /// Run failed and an error report was sent
    Failed,
    /// Another run was still in flight
    Skipped,
}

/// Drives `DiffEngine` runs and routes their results to the notifier.
pub struct Scheduler {
    engine: Arc<DiffEngine>,
    notifier: Notifier,
    interval: Duration,
    initial_delay: Duration,
}

impl Scheduler {
    pub fn new(
        engine: Arc<DiffEngine>,
        notifier: Notifier,
        interval: Duration,
        initial_delay: Duration,
    ) -> Self {
        Self {
            engine,
            notifier,
            interval,
            initial_delay,
        }
    }

    pub fn from_config(engine: Arc<DiffEngine>, notifier: Notifier, config: &ScheduleConfig) -> Self {
        Self::new(engine, notifier, config.interval(), config.initial_delay())
    }

    /// Announce startup, then tick forever.
    pub async fn run(&self) {
        if let Err(e) = self
            .notifier
            .send_startup(self.initial_delay.as_secs(), self.interval.as_secs() / 60)
            .await
        {
            log::error!("Failed to send startup message: {}", e);
        }

        log::info!(
            "Scheduler active: first run in {:?}, then every {:?}",
            self.initial_delay,
            self.interval
        );

        let mut ticker = time::interval_at(Instant::now() + self.initial_delay, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.tick().await;
        }
    }

    /// Run once and deliver the outcome. Failures are never retried here;
    /// the next tick is the retry.
    pub async fn tick(&self) -> TickOutcome {
        log::info!("Scheduled run starting");

        match self.engine.try_run_once().await {
            Ok(Some(batch)) => {
                if let Err(e) = self.notifier.send_batch(&batch).await {
                    log::error!("Failed to deliver run batch: {}", e);
                }
                TickOutcome::Completed(batch.status())
            }
            Ok(None) => TickOutcome::Skipped,
            Err(e) => {
                let report = format!("Scheduled run failed: {e}");
                log::error!("{}", report);
                if let Err(e) = self.notifier.send_error(&report).await {
                    log::error!("Failed to deliver error report: {}", e);
                }
                TickOutcome::Failed
            }
        }
    }
}

//! Fixed-cadence scheduler for poll cycles

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::orchestrator::PollCycle;

/// Runs a [`PollCycle`] until cancelled, sleeping `interval` after each
/// completed cycle so cycles never overlap.
pub struct Scheduler {
    cycle: PollCycle,
    interval: Duration,
}

impl Scheduler {
    pub fn new(cycle: PollCycle, interval: Duration) -> Self {
        Self { cycle, interval }
    }

    pub fn cycle(&self) -> &PollCycle {
        &self.cycle
    }

    /// Loop until `cancel` fires. A failed cycle is logged and the loop
    /// carries on with the next one.
    pub async fn run(&self, cancel: CancellationToken) {
        info!(
            bucket = %self.cycle.bucket(),
            interval_ms = self.interval.as_millis() as u64,
            "Scheduler started"
        );

        while !cancel.is_cancelled() {
            match self.cycle.run_cycle(&cancel).await {
                Ok(report) => debug!(summary = %report, "Cycle finished"),
                Err(e) => error!(error = %format!("{:#}", e), "Fatal error during poll cycle"),
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {},
            }
        }

        info!("Scheduler stopped");
    }
}

use super::log_pass;
use crate::application::process_batch::ProcessBatchUseCase;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Runs one pass per tick until the shutdown flag flips to `true`.
pub struct Poller {
    use_case: Arc<ProcessBatchUseCase>,
    source_id: String,
    interval: Duration,
}

impl Poller {
    pub fn new(use_case: Arc<ProcessBatchUseCase>, source_id: impl Into<String>, interval: Duration) -> Self {
        Self {
            use_case,
            source_id: source_id.into(),
            interval,
        }
    }

    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(source_id = %self.source_id, interval_secs = self.interval.as_secs(), "poller started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let result = self.use_case.run_pass(&self.source_id).await;
                    log_pass("poll", &self.source_id, result);
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!(source_id = %self.source_id, "poller stopped");
    }
}

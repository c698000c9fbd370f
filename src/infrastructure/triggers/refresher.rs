use crate::application::snapshot::SnapshotCell;
use crate::domain::ports::blacklist_store::BlacklistStore;
use crate::domain::ports::reference_registry::ReferenceRegistry;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::warn;

/// Reloads the rule snapshot on a fixed period. A failed reload keeps the
/// previous snapshot in place.
pub struct SnapshotRefresher {
    cell: Arc<SnapshotCell>,
    rules: Arc<dyn BlacklistStore>,
    registry: Arc<dyn ReferenceRegistry>,
    interval: Duration,
}

impl SnapshotRefresher {
    pub fn new(
        cell: Arc<SnapshotCell>,
        rules: Arc<dyn BlacklistStore>,
        registry: Arc<dyn ReferenceRegistry>,
        interval: Duration,
    ) -> Self {
        Self {
            cell,
            rules,
            registry,
            interval,
        }
    }

    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick fires immediately; the snapshot is already fresh.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.cell.reload(self.rules.as_ref(), self.registry.as_ref()) {
                            warn!(error = %e, "snapshot reload failed, keeping previous version");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }
        })
    }
}

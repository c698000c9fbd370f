//! Ingestion triggers. Each one is a thin adapter over
//! [`ProcessBatchUseCase`](crate::application::process_batch::ProcessBatchUseCase).

pub mod notifier;
pub mod poller;
pub mod refresher;

use crate::application::process_batch::PassOutcome;
use crate::domain::error::DomainError;
use tracing::{debug, warn};

fn log_pass(trigger: &str, source_id: &str, result: Result<PassOutcome, DomainError>) {
    match result {
        Ok(PassOutcome::Completed(report)) => debug!(
            trigger,
            source_id,
            processed = report.processed,
            detections = report.detections,
            "trigger handled"
        ),
        Ok(PassOutcome::Coalesced { .. }) => debug!(trigger, source_id, "trigger coalesced"),
        Err(e) => warn!(trigger, source_id, error = %e, "pass failed"),
    }
}

//! Batch processing against one ingestion source, shared by every trigger.

use crate::application::pipeline::{DetectionPipeline, MessageOutcome};
use crate::application::snapshot::{RuleSnapshot, SnapshotCell};
use crate::application::settings::EngineSettings;
use crate::domain::entities::cursor::CursorDelta;
use crate::domain::entities::message::Message;
use crate::domain::error::DomainError;
use crate::domain::ports::cursor_store::CursorStore;
use crate::domain::ports::message_source::MessageSource;
use crate::domain::values::cursor_pointer::CursorPointer;
use chrono::Utc;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, Serialize)]
pub struct PassReport {
    pub source_id: String,
    pub snapshot_version: u64,
    /// Units of work run under one guard: the initial one plus coalesced ones.
    pub sweeps: usize,
    pub fetched: usize,
    pub processed: usize,
    pub skipped: usize,
    pub detections: usize,
    pub duplicates: usize,
    pub errors: usize,
    pub arbitration_calls: usize,
    pub arbitration_failures: usize,
    pub cursor: Option<CursorPointer>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PassOutcome {
    Completed(PassReport),
    /// Another pass for the source was running and picked up this trigger.
    Coalesced { source_id: String },
}

enum Work {
    Sweep,
    Batch(Vec<Message>),
}

#[derive(Default)]
struct SourceState {
    running: bool,
    rerun: bool,
    pending: Vec<Message>,
}

type States = Mutex<HashMap<String, SourceState>>;

/// Releases the source if a pass ends early. Dropping after an abort keeps
/// pushed messages queued for the next trigger.
struct FlightGuard<'a> {
    states: &'a States,
    source_id: &'a str,
    armed: bool,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(state) = states.get_mut(self.source_id) {
            state.running = false;
            state.rerun = false;
        }
    }
}

pub struct ProcessBatchUseCase {
    pipeline: Arc<DetectionPipeline>,
    source: Arc<dyn MessageSource>,
    cursors: Arc<dyn CursorStore>,
    snapshots: Arc<SnapshotCell>,
    settings: EngineSettings,
    states: States,
}

impl ProcessBatchUseCase {
    pub fn new(
        pipeline: Arc<DetectionPipeline>,
        source: Arc<dyn MessageSource>,
        cursors: Arc<dyn CursorStore>,
        snapshots: Arc<SnapshotCell>,
    ) -> Self {
        let settings = pipeline.settings().clone();
        Self {
            pipeline,
            source,
            cursors,
            snapshots,
            settings,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Last durable pointer, or the start of the catch-up window.
    pub fn load_cursor(&self, source_id: &str) -> Result<CursorPointer, DomainError> {
        Ok(match self.cursors.load(source_id)? {
            Some(cursor) => cursor.pointer,
            None => CursorPointer::start_of_window(Utc::now(), self.settings.catch_up_window_hours),
        })
    }

    /// Process everything newer than the source's cursor.
    pub async fn run_pass(&self, source_id: &str) -> Result<PassOutcome, DomainError> {
        self.run(source_id, Work::Sweep).await
    }

    /// Process messages pushed by a notification trigger.
    pub async fn process_batch(
        &self,
        source_id: &str,
        messages: Vec<Message>,
    ) -> Result<PassOutcome, DomainError> {
        self.run(source_id, Work::Batch(messages)).await
    }

    pub fn is_running(&self, source_id: &str) -> bool {
        self.states
            .lock()
            .map(|s| s.get(source_id).is_some_and(|st| st.running))
            .unwrap_or(false)
    }

    async fn run(&self, source_id: &str, work: Work) -> Result<PassOutcome, DomainError> {
        if !self.try_acquire(source_id, &work)? {
            info!(source_id, "pass already running, trigger coalesced");
            return Ok(PassOutcome::Coalesced {
                source_id: source_id.to_string(),
            });
        }
        let mut guard = FlightGuard {
            states: &self.states,
            source_id,
            armed: true,
        };

        let snapshot = self.snapshots.current()?;
        let mut report = PassReport {
            source_id: source_id.to_string(),
            snapshot_version: snapshot.version,
            ..PassReport::default()
        };

        let mut next = Some(work);
        while let Some(work) = next {
            report.sweeps += 1;
            let messages = match work {
                Work::Sweep => {
                    let after = self.load_cursor(source_id)?;
                    let since = CursorPointer::start_of_window(Utc::now(), self.settings.catch_up_window_hours);
                    let limit = self.settings.batch_limit;
                    let mut messages = self
                        .source
                        .fetch_edits(source_id, since.observed_at, &after, limit)?;
                    let remaining = limit.saturating_sub(messages.len());
                    if remaining > 0 {
                        messages.extend(self.source.fetch_after(source_id, &after, remaining)?);
                    }
                    messages
                }
                Work::Batch(mut messages) => {
                    messages.sort_by_key(|m| m.pointer());
                    messages
                }
            };
            report.fetched += messages.len();
            if let Err(e) = self.process_messages(source_id, &messages, &snapshot, &mut report).await {
                warn!(
                    source_id,
                    error = %e,
                    processed = report.processed,
                    "pass aborted, will resume from last cursor"
                );
                return Err(e);
            }
            next = self.next_work(source_id)?;
        }
        guard.armed = false;

        info!(
            source_id,
            sweeps = report.sweeps,
            processed = report.processed,
            detections = report.detections,
            errors = report.errors,
            "pass completed"
        );
        Ok(PassOutcome::Completed(report))
    }

    async fn process_messages(
        &self,
        source_id: &str,
        messages: &[Message],
        snapshot: &RuleSnapshot,
        report: &mut PassReport,
    ) -> Result<(), DomainError> {
        for message in messages {
            let delta = match self.pipeline.process_message(message, snapshot).await {
                Ok(MessageOutcome::Skipped { .. }) => {
                    report.skipped += 1;
                    CursorDelta::message(0)
                }
                Ok(MessageOutcome::Processed(outcome)) => {
                    report.processed += 1;
                    report.detections += outcome.recorded.len();
                    report.duplicates += outcome.duplicates;
                    report.arbitration_calls += outcome.arbitration_calls;
                    report.arbitration_failures += outcome.arbitration_failures;
                    CursorDelta::message(outcome.recorded.len() as u64)
                }
                Err(e) if e.halts_pass() => return Err(e),
                Err(e) => {
                    warn!(source_id, message_id = %message.id, error = %e, "message failed");
                    report.errors += 1;
                    CursorDelta::failed_message()
                }
            };
            let pointer = message.pointer();
            self.cursors.advance(source_id, &pointer, delta)?;
            if message.revision > 0 {
                self.source.mark_processed(source_id, message)?;
            }
            if report.cursor.as_ref().map_or(true, |c| pointer > *c) {
                report.cursor = Some(pointer);
            }
        }
        Ok(())
    }

    /// Claim the source, or queue `work` on the pass that already holds it.
    fn try_acquire(&self, source_id: &str, work: &Work) -> Result<bool, DomainError> {
        let mut states = self
            .states
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let state = states.entry(source_id.to_string()).or_default();
        if !state.running {
            state.running = true;
            return Ok(true);
        }
        match work {
            Work::Sweep => state.rerun = true,
            Work::Batch(messages) => state.pending.extend(messages.iter().cloned()),
        }
        Ok(false)
    }

    /// Coalesced work for the running pass, or release the source.
    fn next_work(&self, source_id: &str) -> Result<Option<Work>, DomainError> {
        let mut states = self
            .states
            .lock()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        let state = states.entry(source_id.to_string()).or_default();
        if !state.pending.is_empty() {
            return Ok(Some(Work::Batch(std::mem::take(&mut state.pending))));
        }
        if state.rerun {
            state.rerun = false;
            return Ok(Some(Work::Sweep));
        }
        state.running = false;
        Ok(None)
    }
}

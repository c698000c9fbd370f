pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;

use crate::application::aggregate::AggregateUseCase;
use crate::application::pipeline::{DetectionPipeline, MessageOutcome};
use crate::application::process_batch::{PassOutcome, ProcessBatchUseCase};
use crate::application::snapshot::{RuleSnapshot, SnapshotCell};
use crate::domain::entities::arbitration_record::ArbitrationRecord;
use crate::domain::entities::blacklist_rule::BlacklistRule;
use crate::domain::entities::cursor::{CursorDelta, ProcessingCursor};
use crate::domain::entities::daily_rollup::DailyRollup;
use crate::domain::entities::detection::Detection;
use crate::domain::entities::message::Message;
use crate::domain::entities::reference_entry::ReferenceEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::arbitration_log::ArbitrationLog;
use crate::domain::ports::arbitrator::Arbitrator;
use crate::domain::ports::blacklist_store::BlacklistStore;
use crate::domain::ports::cursor_store::CursorStore;
use crate::domain::ports::detection_repository::{DetectionFilter, DetectionRepository};
use crate::domain::values::cursor_pointer::CursorPointer;
use crate::infrastructure::arbitration::build_arbitrator;
use crate::infrastructure::config::settings::Config;
use crate::infrastructure::sqlite::arbitration_log_repo::SqliteArbitrationLog;
use crate::infrastructure::sqlite::blacklist_repo::SqliteBlacklistStore;
use crate::infrastructure::sqlite::cursor_repo::SqliteCursorRepo;
use crate::infrastructure::sqlite::detection_repo::SqliteDetectionRepo;
use crate::infrastructure::sqlite::message_repo::SqliteMessageRepo;
use crate::infrastructure::sqlite::open_database;
use crate::infrastructure::sqlite::reference_repo::SqliteReferenceRegistry;
use crate::infrastructure::sqlite::rollup_repo::SqliteRollupRepo;
use crate::infrastructure::triggers::notifier::{NotificationSender, Notifier};
use crate::infrastructure::triggers::poller::Poller;
use crate::infrastructure::triggers::refresher::SnapshotRefresher;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;

pub struct TickerWatch {
    config: Config,
    messages: Arc<SqliteMessageRepo>,
    rules: Arc<SqliteBlacklistStore>,
    registry: Arc<SqliteReferenceRegistry>,
    detections: Arc<dyn DetectionRepository>,
    cursors: Arc<dyn CursorStore>,
    arbitration_log: Arc<dyn ArbitrationLog>,
    snapshots: Arc<SnapshotCell>,
    pipeline: Arc<DetectionPipeline>,
    batch_uc: Arc<ProcessBatchUseCase>,
    aggregate_uc: AggregateUseCase,
}

impl TickerWatch {
    pub fn new(config: Config) -> Result<Self, DomainError> {
        let arbitrator = build_arbitrator(&config.arbitration);
        Self::with_providers(config, arbitrator)
    }

    pub fn with_providers(config: Config, arbitrator: Arc<dyn Arbitrator>) -> Result<Self, DomainError> {
        config.validate()?;
        let conn = open_database(&config.database_path)?;

        let messages = Arc::new(SqliteMessageRepo::new(conn.clone()));
        let rules = Arc::new(SqliteBlacklistStore::new(conn.clone()));
        let registry = Arc::new(SqliteReferenceRegistry::new(conn.clone()));
        let detections: Arc<dyn DetectionRepository> = Arc::new(SqliteDetectionRepo::new(conn.clone()));
        let cursors: Arc<dyn CursorStore> = Arc::new(SqliteCursorRepo::new(conn.clone()));
        let arbitration_log: Arc<dyn ArbitrationLog> = Arc::new(SqliteArbitrationLog::new(conn.clone()));
        let rollups = Arc::new(SqliteRollupRepo::new(conn));

        let snapshots = Arc::new(SnapshotCell::new(RuleSnapshot::load(
            1,
            rules.as_ref(),
            registry.as_ref(),
        )?));
        let pipeline = Arc::new(DetectionPipeline::new(
            config.engine.clone(),
            arbitrator,
            arbitration_log.clone(),
            messages.clone(),
            detections.clone(),
        ));
        let batch_uc = Arc::new(ProcessBatchUseCase::new(
            pipeline.clone(),
            messages.clone(),
            cursors.clone(),
            snapshots.clone(),
        ));

        Ok(Self {
            aggregate_uc: AggregateUseCase::new(detections.clone(), rollups),
            config,
            messages,
            rules,
            registry,
            detections,
            cursors,
            arbitration_log,
            snapshots,
            pipeline,
            batch_uc,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // Snapshot

    pub fn snapshot(&self) -> Result<Arc<RuleSnapshot>, DomainError> {
        self.snapshots.current()
    }

    pub fn refresh_snapshot(&self) -> Result<Arc<RuleSnapshot>, DomainError> {
        self.snapshots.reload(self.rules.as_ref(), self.registry.as_ref())
    }

    // Ingestion and processing

    /// Store a message and return its revision, which counts text edits.
    pub fn ingest(&self, message: &Message) -> Result<u64, DomainError> {
        if message.id.trim().is_empty() {
            return Err(DomainError::InvalidInput("message id is required".into()));
        }
        self.messages.upsert(message)
    }

    pub fn ingest_all(&self, messages: &[Message]) -> Result<usize, DomainError> {
        for message in messages {
            self.ingest(message)?;
        }
        Ok(messages.len())
    }

    /// Score free text against the current snapshot without arbitration or writes.
    pub async fn scan_text(&self, text: &str) -> Result<MessageOutcome, DomainError> {
        let message = Message::new(
            format!("scan-{}", uuid::Uuid::new_v4()),
            "scan",
            "operator",
            text,
            Utc::now(),
        );
        let snapshot = self.snapshot()?;
        Ok(self.pipeline.scan(&message, &snapshot).await)
    }

    /// Process one message outside any cursor.
    pub async fn process_message(&self, message: &Message) -> Result<MessageOutcome, DomainError> {
        let snapshot = self.snapshot()?;
        self.pipeline.process_message(message, &snapshot).await
    }

    pub async fn run_pass(&self, source_id: &str) -> Result<PassOutcome, DomainError> {
        self.batch_uc.run_pass(source_id).await
    }

    /// Store pushed messages, then process them under the source's guard.
    pub async fn process_batch(
        &self,
        source_id: &str,
        messages: Vec<Message>,
    ) -> Result<PassOutcome, DomainError> {
        let mut messages = messages;
        for message in &mut messages {
            message.revision = self.ingest(message)?;
        }
        self.batch_uc.process_batch(source_id, messages).await
    }

    pub fn batch_use_case(&self) -> Arc<ProcessBatchUseCase> {
        self.batch_uc.clone()
    }

    // Cursors

    pub fn load_cursor(&self, source_id: &str) -> Result<CursorPointer, DomainError> {
        self.batch_uc.load_cursor(source_id)
    }

    pub fn cursor(&self, source_id: &str) -> Result<Option<ProcessingCursor>, DomainError> {
        self.cursors.load(source_id)
    }

    pub fn cursors(&self) -> Result<Vec<ProcessingCursor>, DomainError> {
        self.cursors.list()
    }

    pub fn advance_cursor(&self, source_id: &str, pointer: &CursorPointer) -> Result<bool, DomainError> {
        self.cursors.advance(source_id, pointer, CursorDelta::default())
    }

    // Detections and rollups

    pub fn record_detection(&self, detection: &Detection) -> Result<bool, DomainError> {
        self.detections.record(detection)
    }

    pub fn detections(&self, filter: &DetectionFilter) -> Result<Vec<Detection>, DomainError> {
        self.detections.query(filter)
    }

    pub fn detection_count(&self) -> Result<usize, DomainError> {
        self.detections.count()
    }

    pub fn rollup(&self, date: NaiveDate) -> Result<Vec<DailyRollup>, DomainError> {
        self.aggregate_uc.rollup(date)
    }

    pub fn rollup_range(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<DailyRollup>, DomainError> {
        self.aggregate_uc.rollup_range(from, to)
    }

    pub fn top_symbols(&self, date: NaiveDate, limit: usize) -> Result<Vec<DailyRollup>, DomainError> {
        self.aggregate_uc.top(date, limit)
    }

    // Operator tooling. Writes reload the snapshot so the next pass sees them.

    pub fn seed_default_rules(&self) -> Result<usize, DomainError> {
        let added = self.rules.seed_default_rules()?;
        self.refresh_snapshot()?;
        Ok(added)
    }

    pub fn rules(&self) -> Result<Vec<BlacklistRule>, DomainError> {
        self.rules.all_rules()
    }

    pub fn upsert_rule(&self, rule: &BlacklistRule) -> Result<BlacklistRule, DomainError> {
        let saved = self.rules.upsert_rule(rule)?;
        self.refresh_snapshot()?;
        Ok(saved)
    }

    pub fn delete_rule(&self, symbol: &str) -> Result<(), DomainError> {
        self.rules.delete_rule(symbol)?;
        self.refresh_snapshot()?;
        Ok(())
    }

    pub fn add_reference(&self, entry: &ReferenceEntry) -> Result<ReferenceEntry, DomainError> {
        let saved = self.registry.upsert(entry)?;
        self.refresh_snapshot()?;
        Ok(saved)
    }

    pub fn arbitration_history(
        &self,
        symbol: Option<&str>,
        limit: usize,
    ) -> Result<Vec<ArbitrationRecord>, DomainError> {
        self.arbitration_log.recent(symbol, limit)
    }

    // Triggers

    pub fn poller(&self, source_id: &str) -> Poller {
        Poller::new(
            self.batch_uc.clone(),
            source_id,
            Duration::from_secs(self.config.poll_interval_secs),
        )
    }

    pub fn notifier(&self, capacity: usize) -> (NotificationSender, Notifier) {
        Notifier::channel(self.batch_uc.clone(), self.messages.clone(), capacity)
    }

    pub fn snapshot_refresher(&self) -> SnapshotRefresher {
        SnapshotRefresher::new(
            self.snapshots.clone(),
            self.rules.clone(),
            self.registry.clone(),
            Duration::from_secs(self.config.snapshot_refresh_secs),
        )
    }
}

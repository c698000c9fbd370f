//! Referral of borderline candidates to the external arbitrator.

use crate::application::settings::EngineSettings;
use crate::domain::entities::arbitration_record::ArbitrationRecord;
use crate::domain::entities::message::Message;
use crate::domain::ports::arbitration_log::ArbitrationLog;
use crate::domain::ports::arbitrator::{Arbitrator, Verdict};
use crate::domain::ports::message_source::MentionHistory;
use crate::domain::values::confidence::Confidence;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Ceiling applied to a candidate the arbitrator says is not a stock.
pub const DISAGREEMENT_CEILING: f64 = 0.3;

#[derive(Debug, Clone, PartialEq)]
pub enum ArbitrationResult {
    Verdict(Verdict),
    /// Timeout, transport error or unusable response. The caller keeps the
    /// pre-arbitration score.
    Failed(String),
}

pub struct ArbitrationStage {
    arbitrator: Arc<dyn Arbitrator>,
    log: Arc<dyn ArbitrationLog>,
    settings: EngineSettings,
    last_call: Mutex<Option<Instant>>,
}

impl ArbitrationStage {
    pub fn new(
        arbitrator: Arc<dyn Arbitrator>,
        log: Arc<dyn ArbitrationLog>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            arbitrator,
            log,
            settings,
            last_call: Mutex::new(None),
        }
    }

    pub fn provider(&self) -> &str {
        self.arbitrator.name()
    }

    pub async fn arbitrate(
        &self,
        symbol: &str,
        message: &Message,
        history: &dyn MentionHistory,
    ) -> ArbitrationResult {
        let excerpts = self.excerpts(symbol, message, history);
        self.throttle().await;

        let timeout = Duration::from_millis(self.settings.arbitration_timeout_ms);
        let result = match tokio::time::timeout(timeout, self.arbitrator.classify(symbol, &excerpts)).await {
            Ok(Ok(verdict)) => ArbitrationResult::Verdict(Verdict {
                confidence: Confidence::clamped(verdict.confidence).value(),
                ..verdict
            }),
            Ok(Err(e)) => ArbitrationResult::Failed(e.to_string()),
            Err(_) => ArbitrationResult::Failed(format!(
                "timed out after {}ms",
                self.settings.arbitration_timeout_ms
            )),
        };

        match &result {
            ArbitrationResult::Verdict(verdict) => {
                debug!(
                    symbol,
                    message_id = %message.id,
                    genuine = verdict.is_genuine_stock,
                    confidence = verdict.confidence,
                    "arbitration verdict"
                );
                self.audit(symbol, message, verdict);
            }
            ArbitrationResult::Failed(reason) => {
                warn!(
                    symbol,
                    message_id = %message.id,
                    provider = self.provider(),
                    reason = %reason,
                    "arbitration failed, keeping deterministic score"
                );
            }
        }
        result
    }

    /// Fold a verdict into the current score.
    pub fn apply(confidence: f64, verdict: &Verdict) -> f64 {
        if verdict.is_genuine_stock {
            confidence.max(verdict.confidence)
        } else {
            confidence.min(DISAGREEMENT_CEILING)
        }
    }

    /// The current message first, then recent messages mentioning `symbol`.
    fn excerpts(&self, symbol: &str, message: &Message, history: &dyn MentionHistory) -> Vec<String> {
        let limit = self.settings.arbitration_excerpts.max(1);
        let mut excerpts = vec![message.text.clone()];
        let since = message.observed_at
            - ChronoDuration::hours(self.settings.recent_mention_window_hours as i64);
        match history.recent_mentions(symbol, since, message.observed_at, Some(&message.id), limit - 1) {
            Ok(samples) => excerpts.extend(samples.into_iter().map(|s| s.text)),
            Err(e) => debug!(symbol, error = %e, "no mention history for arbitration excerpts"),
        }
        excerpts.truncate(limit);
        excerpts
    }

    /// Space consecutive calls at least `arbitration_batch_delay_ms` apart.
    async fn throttle(&self) {
        let delay = Duration::from_millis(self.settings.arbitration_batch_delay_ms);
        let mut last = self.last_call.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < delay {
                tokio::time::sleep(delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    fn audit(&self, symbol: &str, message: &Message, verdict: &Verdict) {
        let record = ArbitrationRecord {
            id: uuid::Uuid::new_v4().to_string(),
            symbol: symbol.to_string(),
            message_id: message.id.clone(),
            provider: self.provider().to_string(),
            is_genuine_stock: verdict.is_genuine_stock,
            confidence: verdict.confidence,
            reasoning: verdict.reasoning.clone(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.log.record_verdict(&record) {
            warn!(symbol, message_id = %message.id, error = %e, "failed to record arbitration verdict");
        }
    }
}

//! Per-message detection pipeline: extract, score, disambiguate, cross-check,
//! arbitrate, then record accepted detections.

use crate::application::arbitration::{ArbitrationResult, ArbitrationStage};
use crate::application::context::ContextAnalyzer;
use crate::application::cross_check::RegistryCrossCheck;
use crate::application::disambiguator::{BlacklistDecision, BlacklistDisambiguator, DisambiguationInput};
use crate::application::extractor::CandidateExtractor;
use crate::application::scorer::ConfidenceScorer;
use crate::application::settings::EngineSettings;
use crate::application::snapshot::RuleSnapshot;
use crate::domain::entities::candidate::{Candidate, ScoredCandidate};
use crate::domain::entities::detection::Detection;
use crate::domain::entities::message::Message;
use crate::domain::error::DomainError;
use crate::domain::ports::arbitration_log::ArbitrationLog;
use crate::domain::ports::arbitrator::Arbitrator;
use crate::domain::ports::detection_repository::DetectionRepository;
use crate::domain::ports::message_source::MentionHistory;
use crate::domain::values::context::ContextSignals;
use crate::domain::values::extraction_method::ExtractionMethod;
use crate::domain::values::rule_outcome::RuleOutcome;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    Live,
    /// No arbitration calls and no writes.
    DryRun,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MessageReport {
    pub message_id: String,
    pub candidates: Vec<ScoredCandidate>,
    pub recorded: Vec<Detection>,
    pub duplicates: usize,
    pub arbitration_calls: usize,
    pub arbitration_failures: usize,
}

impl MessageReport {
    pub fn accepted(&self) -> impl Iterator<Item = &ScoredCandidate> {
        self.candidates.iter().filter(|c| c.is_accepted())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MessageOutcome {
    /// Empty or too-short text.
    Skipped { message_id: String },
    Processed(MessageReport),
}

impl MessageOutcome {
    pub fn report(&self) -> Option<&MessageReport> {
        match self {
            MessageOutcome::Processed(report) => Some(report),
            MessageOutcome::Skipped { .. } => None,
        }
    }
}

pub struct DetectionPipeline {
    settings: EngineSettings,
    extractor: CandidateExtractor,
    analyzer: ContextAnalyzer,
    scorer: ConfidenceScorer,
    disambiguator: BlacklistDisambiguator,
    cross_check: RegistryCrossCheck,
    arbitration: ArbitrationStage,
    history: Arc<dyn MentionHistory>,
    detections: Arc<dyn DetectionRepository>,
}

impl DetectionPipeline {
    pub fn new(
        settings: EngineSettings,
        arbitrator: Arc<dyn Arbitrator>,
        arbitration_log: Arc<dyn ArbitrationLog>,
        history: Arc<dyn MentionHistory>,
        detections: Arc<dyn DetectionRepository>,
    ) -> Self {
        Self {
            extractor: CandidateExtractor::new(),
            analyzer: ContextAnalyzer::new(),
            scorer: ConfidenceScorer::new(settings.clone()),
            disambiguator: BlacklistDisambiguator::new(settings.clone()),
            cross_check: RegistryCrossCheck::new(settings.clone()),
            arbitration: ArbitrationStage::new(arbitrator, arbitration_log, settings.clone()),
            settings,
            history,
            detections,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Run one message through every stage and record what was accepted.
    /// Only store errors are returned; everything else is folded into the report.
    pub async fn process_message(
        &self,
        message: &Message,
        snapshot: &RuleSnapshot,
    ) -> Result<MessageOutcome, DomainError> {
        if message.is_malformed(self.settings.min_message_len) {
            debug!(message_id = %message.id, "skipping malformed message");
            return Ok(MessageOutcome::Skipped {
                message_id: message.id.clone(),
            });
        }

        let mut report = self.evaluate(message, snapshot, EvaluationMode::Live).await;
        for scored in report.candidates.iter().filter(|c| c.is_accepted()) {
            let detection = Detection::from_scored(message, scored);
            if self.detections.record(&detection)? {
                report.recorded.push(detection);
            } else {
                debug!(message_id = %message.id, symbol = %scored.symbol(), "detection already recorded");
                report.duplicates += 1;
            }
        }
        Ok(MessageOutcome::Processed(report))
    }

    /// Score a message without arbitration or persistence.
    pub async fn scan(&self, message: &Message, snapshot: &RuleSnapshot) -> MessageOutcome {
        if message.is_malformed(self.settings.min_message_len) {
            return MessageOutcome::Skipped {
                message_id: message.id.clone(),
            };
        }
        MessageOutcome::Processed(self.evaluate(message, snapshot, EvaluationMode::DryRun).await)
    }

    pub async fn evaluate(
        &self,
        message: &Message,
        snapshot: &RuleSnapshot,
        mode: EvaluationMode,
    ) -> MessageReport {
        let signals = self.analyzer.analyze(&message.text);
        let mut report = MessageReport {
            message_id: message.id.clone(),
            ..MessageReport::default()
        };
        // One arbitration call per symbol per message.
        let mut verdicts: HashMap<String, ArbitrationResult> = HashMap::new();

        for candidate in self.extractor.extract(&message.text) {
            if let Some(scored) = self
                .evaluate_candidate(candidate, message, &signals, snapshot, mode, &mut verdicts, &mut report)
                .await
            {
                debug!(
                    message_id = %message.id,
                    symbol = %scored.symbol(),
                    confidence = scored.final_confidence,
                    outcome = %scored.outcome,
                    "candidate evaluated"
                );
                report.candidates.push(scored);
            }
        }
        report
    }

    #[allow(clippy::too_many_arguments)]
    async fn evaluate_candidate(
        &self,
        candidate: Candidate,
        message: &Message,
        signals: &ContextSignals,
        snapshot: &RuleSnapshot,
        mode: EvaluationMode,
        verdicts: &mut HashMap<String, ArbitrationResult>,
        report: &mut MessageReport,
    ) -> Option<ScoredCandidate> {
        let mut confidence = self.scorer.score(&candidate, signals).value();
        let registry_match = self.cross_check.check(&candidate.symbol, snapshot);

        // Lowercase words only count with an exact listing and trading talk.
        if candidate.extraction_method == ExtractionMethod::MixedCase
            && !(registry_match.is_listed() && signals.has_trader_context)
        {
            return None;
        }

        let rule = snapshot.rule_for(&candidate.symbol);
        let decision = self.disambiguator.evaluate(
            rule,
            &DisambiguationInput {
                candidate: &candidate,
                confidence,
                text: &message.text,
                signals,
                message_id: &message.id,
                observed_at: message.observed_at,
            },
            self.history.as_ref(),
        );

        let mut scored = ScoredCandidate {
            candidate,
            context_strength: signals.context_strength,
            final_confidence: confidence,
            outcome: RuleOutcome::BelowThreshold,
            exchange: None,
            arbitrated: false,
        };

        let mut below_rule_minimum = false;
        let forced_reason = match decision {
            BlacklistDecision::PassThrough => None,
            BlacklistDecision::BelowRuleMinimum { .. } => {
                below_rule_minimum = true;
                None
            }
            BlacklistDecision::RequireArbitration { reason } => Some(reason),
            BlacklistDecision::Reject { permanent: true, .. } => {
                scored.outcome = RuleOutcome::PermanentBlacklist;
                return Some(scored);
            }
            BlacklistDecision::Reject { reason, .. } => {
                scored.outcome = RuleOutcome::Blacklisted { reason };
                return Some(scored);
            }
        };

        confidence = self.cross_check.apply(confidence, &registry_match);
        scored.exchange = registry_match.venue().map(String::from);

        let mut agreed = false;
        let wants_arbitration = forced_reason.is_some()
            || below_rule_minimum
            || self.settings.in_arbitration_band(confidence);
        if wants_arbitration && mode == EvaluationMode::Live {
            let symbol = scored.candidate.symbol.clone();
            let result = match verdicts.get(&symbol) {
                Some(cached) => cached.clone(),
                None => {
                    report.arbitration_calls += 1;
                    let fresh = self
                        .arbitration
                        .arbitrate(&symbol, message, self.history.as_ref())
                        .await;
                    if matches!(fresh, ArbitrationResult::Failed(_)) {
                        report.arbitration_failures += 1;
                    }
                    verdicts.insert(symbol, fresh.clone());
                    fresh
                }
            };
            if let ArbitrationResult::Verdict(verdict) = result {
                scored.arbitrated = true;
                confidence = ArbitrationStage::apply(confidence, &verdict);
                if !verdict.is_genuine_stock {
                    scored.final_confidence = confidence;
                    scored.outcome = RuleOutcome::ArbitrationRejected;
                    return Some(scored);
                }
                agreed = true;
            }
        }

        scored.final_confidence = confidence;
        scored.outcome = match forced_reason {
            Some(reason) if !agreed => RuleOutcome::Blacklisted { reason },
            _ if confidence >= self.settings.accept_threshold
                && rule.map_or(true, |r| confidence >= r.min_confidence) =>
            {
                RuleOutcome::Accepted
            }
            _ => RuleOutcome::BelowThreshold,
        };
        Some(scored)
    }
}

//! Blacklist rule evaluation for ambiguous symbols.

use crate::application::context::ContextAnalyzer;
use crate::application::settings::EngineSettings;
use crate::domain::entities::blacklist_rule::BlacklistRule;
use crate::domain::entities::candidate::Candidate;
use crate::domain::ports::message_source::MentionHistory;
use crate::domain::values::context::ContextSignals;
use chrono::{DateTime, Duration, Utc};
use tracing::warn;

/// Mentions needed before a blacklisted symbol can be re-admitted.
const READMISSION_MIN_MENTIONS: usize = 3;
const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub enum BlacklistDecision {
    PassThrough,
    Reject { reason: String, permanent: bool },
    /// Blacklisted unless arbitration agrees.
    RequireArbitration { reason: String },
    /// Rule checks passed but confidence sits under the rule's minimum.
    /// Still a candidate; only an agreeing verdict can lift it.
    BelowRuleMinimum { min_confidence: f64 },
}

pub struct DisambiguationInput<'a> {
    pub candidate: &'a Candidate,
    pub confidence: f64,
    pub text: &'a str,
    pub signals: &'a ContextSignals,
    pub message_id: &'a str,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecentMentions {
    pub count: usize,
    pub strong_context: bool,
}

#[derive(Debug, Clone)]
pub struct BlacklistDisambiguator {
    settings: EngineSettings,
    analyzer: ContextAnalyzer,
}

impl BlacklistDisambiguator {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            analyzer: ContextAnalyzer::new(),
        }
    }

    /// Apply `rule` to one candidate. Rules are checked in order; the first
    /// failing check decides. Non-permanent failures other than an excluded
    /// phrase may be re-admitted for arbitration on recent-mention evidence.
    pub fn evaluate(
        &self,
        rule: Option<&BlacklistRule>,
        input: &DisambiguationInput<'_>,
        history: &dyn MentionHistory,
    ) -> BlacklistDecision {
        let Some(rule) = rule else {
            return BlacklistDecision::PassThrough;
        };

        if rule.is_permanent {
            return BlacklistDecision::Reject {
                reason: "permanently blacklisted".into(),
                permanent: true,
            };
        }

        let text_lower = input.text.to_lowercase();
        if let Some(phrase) = rule.excluded_phrases().find(|p| p.matches_lowercase(&text_lower)) {
            return BlacklistDecision::Reject {
                reason: format!("excluded phrase '{}'", phrase.phrase),
                permanent: false,
            };
        }

        let failure = if rule.required_phrases().next().is_some()
            && !rule.required_phrases().any(|p| p.matches_lowercase(&text_lower))
        {
            Some("no required phrase present")
        } else if rule.requires_cashtag && !input.candidate.extraction_method.is_cashtag_derived() {
            Some("cashtag required")
        } else if rule.requires_price_context && !input.signals.has_price_context {
            Some("price context required")
        } else {
            None
        };

        match failure {
            None if input.confidence < rule.min_confidence => BlacklistDecision::BelowRuleMinimum {
                min_confidence: rule.min_confidence,
            },
            None => BlacklistDecision::PassThrough,
            Some(reason) => {
                let recent = self.recent_mentions(input, history);
                if recent.count >= READMISSION_MIN_MENTIONS && recent.strong_context {
                    BlacklistDecision::RequireArbitration {
                        reason: format!("{reason}; re-admitted after {} recent mentions", recent.count),
                    }
                } else {
                    BlacklistDecision::Reject {
                        reason: reason.to_string(),
                        permanent: false,
                    }
                }
            }
        }
    }

    /// Other recent messages mentioning the candidate's symbol. A history
    /// failure counts as no evidence.
    pub fn recent_mentions(
        &self,
        input: &DisambiguationInput<'_>,
        history: &dyn MentionHistory,
    ) -> RecentMentions {
        let since =
            input.observed_at - Duration::hours(self.settings.recent_mention_window_hours as i64);
        match history.recent_mentions(
            &input.candidate.symbol,
            since,
            input.observed_at,
            Some(input.message_id),
            HISTORY_LIMIT,
        ) {
            Ok(samples) => RecentMentions {
                count: samples.len(),
                strong_context: samples
                    .iter()
                    .any(|s| self.analyzer.is_strong_trading_context(&s.text)),
            },
            Err(e) => {
                warn!(symbol = %input.candidate.symbol, error = %e, "mention history unavailable");
                RecentMentions::default()
            }
        }
    }
}

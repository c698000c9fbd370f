use crate::domain::values::extraction_method::ExtractionMethod;
use crate::domain::values::rule_outcome::RuleOutcome;
use serde::Serialize;

/// An unvalidated token that might be a ticker mention. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub symbol: String,
    pub extraction_method: ExtractionMethod,
    pub original_text: String,
    /// Character offset in the message text.
    pub position: usize,
    pub base_confidence: f64,
}

impl Candidate {
    pub fn new(
        symbol: String,
        extraction_method: ExtractionMethod,
        original_text: String,
        position: usize,
    ) -> Self {
        Self {
            symbol,
            extraction_method,
            original_text,
            position,
            base_confidence: extraction_method.base_confidence(),
        }
    }
}

/// A candidate after every engine stage has had its say.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    pub candidate: Candidate,
    pub context_strength: f64,
    /// Always within `[0, 1]`.
    pub final_confidence: f64,
    pub outcome: RuleOutcome,
    /// Venue tag from the reference registry, when listed.
    pub exchange: Option<String>,
    pub arbitrated: bool,
}

impl ScoredCandidate {
    pub fn symbol(&self) -> &str {
        &self.candidate.symbol
    }

    pub fn is_accepted(&self) -> bool {
        self.outcome.is_accepted()
    }
}

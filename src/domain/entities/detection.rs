use crate::domain::entities::candidate::ScoredCandidate;
use crate::domain::entities::message::Message;
use crate::domain::values::extraction_method::ExtractionMethod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted, accepted ticker mention. Unique on
/// (`message_id`, `symbol`, `position`) and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: String,
    pub message_id: String,
    pub channel_id: String,
    pub author_id: String,
    pub symbol: String,
    pub extraction_method: ExtractionMethod,
    pub final_confidence: f64,
    pub context_strength: f64,
    pub position: usize,
    pub detected_text: String,
    pub exchange: Option<String>,
    pub observed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Detection {
    pub fn from_scored(message: &Message, scored: &ScoredCandidate) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message_id: message.id.clone(),
            channel_id: message.channel_id.clone(),
            author_id: message.author_id.clone(),
            symbol: scored.candidate.symbol.clone(),
            extraction_method: scored.candidate.extraction_method,
            final_confidence: scored.final_confidence,
            context_strength: scored.context_strength,
            position: scored.candidate.position,
            detected_text: scored.candidate.original_text.clone(),
            exchange: scored.exchange.clone(),
            observed_at: message.observed_at,
            created_at: Utc::now(),
        }
    }
}

use crate::domain::error::DomainError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured answer from an external classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_genuine_stock: bool,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: String,
}

/// External classification service consulted for borderline candidates.
#[async_trait]
pub trait Arbitrator: Send + Sync {
    /// Provider name for logs and the audit trail.
    fn name(&self) -> &str;

    /// Classify `symbol` given a few recent message excerpts that mention it.
    async fn classify(&self, symbol: &str, excerpts: &[String]) -> Result<Verdict, DomainError>;
}

use crate::domain::error::DomainError;
use crate::domain::ports::arbitrator::{Arbitrator, Verdict};

/// Used when no provider is configured. Every call fails, so borderline
/// candidates keep their deterministic score.
pub struct DisabledArbitrator;

#[async_trait::async_trait]
impl Arbitrator for DisabledArbitrator {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn classify(&self, _symbol: &str, _excerpts: &[String]) -> Result<Verdict, DomainError> {
        Err(DomainError::Arbitration("arbitration disabled".into()))
    }
}

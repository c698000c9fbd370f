pub mod anthropic;
pub mod disabled;
pub mod openai;
pub mod prompt;

use crate::domain::ports::arbitrator::Arbitrator;
use crate::infrastructure::config::arbitration::{ArbitrationConfig, ArbitrationProvider};
use anthropic::AnthropicArbitrator;
use disabled::DisabledArbitrator;
use openai::OpenAiArbitrator;
use std::sync::Arc;
use tracing::warn;

/// Build the configured arbitrator. A provider without an API key falls back
/// to the disabled one.
pub fn build_arbitrator(config: &ArbitrationConfig) -> Arc<dyn Arbitrator> {
    let key = config.api_key();
    match (config.provider, key) {
        (ArbitrationProvider::None, _) => Arc::new(DisabledArbitrator),
        (ArbitrationProvider::Anthropic, Some(key)) => {
            Arc::new(AnthropicArbitrator::new(key, config.model.clone()))
        }
        (ArbitrationProvider::OpenAi, Some(key)) => {
            Arc::new(OpenAiArbitrator::new(key, config.model.clone()))
        }
        (provider, None) => {
            warn!(%provider, "no API key for arbitration provider, arbitration disabled");
            Arc::new(DisabledArbitrator)
        }
    }
}

use super::prompt::{build_prompt, parse_verdict};
use crate::domain::error::DomainError;
use crate::domain::ports::arbitrator::{Arbitrator, Verdict};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: usize = 256;

pub struct AnthropicArbitrator {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: usize,
    temperature: f64,
    messages: Vec<AnthropicMessage>,
}

#[derive(Serialize)]
struct AnthropicMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

impl AnthropicArbitrator {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "claude-3-5-haiku-latest".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Arbitrator for AnthropicArbitrator {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn classify(&self, symbol: &str, excerpts: &[String]) -> Result<Verdict, DomainError> {
        let resp = self
            .client
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&AnthropicRequest {
                model: self.model.clone(),
                max_tokens: MAX_TOKENS,
                temperature: 0.0,
                messages: vec![AnthropicMessage {
                    role: "user",
                    content: build_prompt(symbol, excerpts),
                }],
            })
            .send()
            .await
            .map_err(|e| DomainError::Arbitration(format!("Anthropic API error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Arbitration(format!("Anthropic API {status}: {body}")));
        }

        let result: AnthropicResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Arbitration(format!("Parse error: {e}")))?;
        let text: String = result.content.into_iter().map(|c| c.text).collect();
        parse_verdict(&text)
    }
}

use super::prompt::{build_prompt, parse_verdict};
use crate::domain::error::DomainError;
use crate::domain::ports::arbitrator::{Arbitrator, Verdict};
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub struct OpenAiArbitrator {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct OpenAiRequest {
    model: String,
    temperature: f64,
    response_format: ResponseFormat,
    messages: Vec<OpenAiMessage>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Serialize)]
struct OpenAiMessage {
    role: &'static str,
    content: String,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiReply,
}

#[derive(Deserialize)]
struct OpenAiReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiArbitrator {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.unwrap_or_else(|| "gpt-4o-mini".to_string()),
        }
    }
}

#[async_trait::async_trait]
impl Arbitrator for OpenAiArbitrator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn classify(&self, symbol: &str, excerpts: &[String]) -> Result<Verdict, DomainError> {
        let resp = self
            .client
            .post("https://api.openai.com/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&OpenAiRequest {
                model: self.model.clone(),
                temperature: 0.0,
                response_format: ResponseFormat { kind: "json_object" },
                messages: vec![OpenAiMessage {
                    role: "user",
                    content: build_prompt(symbol, excerpts),
                }],
            })
            .send()
            .await
            .map_err(|e| DomainError::Arbitration(format!("OpenAI API error: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(DomainError::Arbitration(format!("OpenAI API {status}: {body}")));
        }

        let result: OpenAiResponse = resp
            .json()
            .await
            .map_err(|e| DomainError::Arbitration(format!("Parse error: {e}")))?;
        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| DomainError::Arbitration("OpenAI returned no choices".into()))?;
        parse_verdict(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_uses_json_mode() {
        let request = OpenAiRequest {
            model: "gpt-4o-mini".into(),
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
            messages: vec![],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_null_content_deserializes() {
        let json = r#"{"choices": [{"message": {"role": "assistant", "content": null}}]}"#;
        let response: OpenAiResponse = serde_json::from_str(json).unwrap();
        assert!(response.choices[0].message.content.is_none());
    }
}

//! Prompt and response handling shared by the HTTP arbitrators.

use crate::domain::error::DomainError;
use crate::domain::ports::arbitrator::Verdict;
use crate::domain::values::confidence::Confidence;
use serde::Deserialize;

const MAX_EXCERPT_CHARS: usize = 400;

pub fn build_prompt(symbol: &str, excerpts: &[String]) -> String {
    let mut prompt = format!(
        "You review chat messages from a stock trading community. Decide whether \"{symbol}\" \
         in the messages below refers to an exchange-listed stock ticker, or is an ordinary \
         word, abbreviation or slang.\n\nMessages:\n"
    );
    for (i, excerpt) in excerpts.iter().enumerate() {
        let trimmed: String = excerpt.chars().take(MAX_EXCERPT_CHARS).collect();
        prompt.push_str(&format!("{}. {}\n", i + 1, trimmed.replace('\n', " ")));
    }
    prompt.push_str(
        "\nRespond with only a JSON object of the form \
         {\"is_genuine_stock\": true|false, \"confidence\": <number 0-1>, \"reasoning\": \"<one sentence>\"}.",
    );
    prompt
}

#[derive(Deserialize)]
struct RawVerdict {
    is_genuine_stock: bool,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}

/// Parse a model reply into a verdict. Accepts code fences and surrounding
/// prose; confidence is clamped to `[0, 1]`.
pub fn parse_verdict(reply: &str) -> Result<Verdict, DomainError> {
    let json = extract_json(reply)
        .ok_or_else(|| DomainError::Arbitration(format!("no JSON object in reply: {}", truncate(reply))))?;
    let raw: RawVerdict = serde_json::from_str(json)
        .map_err(|e| DomainError::Arbitration(format!("malformed verdict: {e}")))?;
    if !raw.confidence.is_finite() {
        return Err(DomainError::Arbitration("verdict confidence is not a number".into()));
    }
    Ok(Verdict {
        is_genuine_stock: raw.is_genuine_stock,
        confidence: Confidence::clamped(raw.confidence).value(),
        reasoning: raw.reasoning,
    })
}

fn extract_json(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

fn truncate(s: &str) -> String {
    s.chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_lists_excerpts() {
        let prompt = build_prompt("XPON", &["XPON ww here".into(), "XPON ripping\nagain".into()]);
        assert!(prompt.contains("\"XPON\""));
        assert!(prompt.contains("1. XPON ww here"));
        assert!(prompt.contains("2. XPON ripping again"));
        assert!(prompt.contains("is_genuine_stock"));
    }

    #[test]
    fn test_parse_plain_json() {
        let v = parse_verdict(r#"{"is_genuine_stock": true, "confidence": 0.9, "reasoning": "listed"}"#).unwrap();
        assert!(v.is_genuine_stock);
        assert_eq!(v.confidence, 0.9);
        assert_eq!(v.reasoning, "listed");
    }

    #[test]
    fn test_parse_fenced_reply_and_clamp() {
        let reply = "Sure.\n```json\n{\"is_genuine_stock\": false, \"confidence\": 1.7}\n```";
        let v = parse_verdict(reply).unwrap();
        assert!(!v.is_genuine_stock);
        assert_eq!(v.confidence, 1.0);
        assert!(v.reasoning.is_empty());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_verdict("I think so").is_err());
        assert!(parse_verdict(r#"{"confidence": 0.4}"#).is_err());
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhraseKind {
    Required,
    Excluded,
}

impl fmt::Display for PhraseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhraseKind::Required => write!(f, "required"),
            PhraseKind::Excluded => write!(f, "excluded"),
        }
    }
}

impl FromStr for PhraseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "required" => Ok(PhraseKind::Required),
            "excluded" => Ok(PhraseKind::Excluded),
            _ => Err(format!("Unknown phrase kind: {s}")),
        }
    }
}

/// One entry of a rule's phrase list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhraseRule {
    pub kind: PhraseKind,
    pub phrase: String,
}

impl PhraseRule {
    pub fn required(phrase: impl Into<String>) -> Self {
        Self {
            kind: PhraseKind::Required,
            phrase: phrase.into(),
        }
    }

    pub fn excluded(phrase: impl Into<String>) -> Self {
        Self {
            kind: PhraseKind::Excluded,
            phrase: phrase.into(),
        }
    }

    /// Case-insensitive substring match against already-lowercased text.
    pub fn matches_lowercase(&self, text_lower: &str) -> bool {
        !self.phrase.is_empty() && text_lower.contains(&self.phrase.to_lowercase())
    }
}

/// Per-symbol override controlling how much evidence is needed before a
/// detection is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlacklistRule {
    pub symbol: String,
    #[serde(default)]
    pub min_confidence: f64,
    #[serde(default)]
    pub requires_cashtag: bool,
    #[serde(default)]
    pub requires_price_context: bool,
    /// Ordered; required and excluded entries are interleaved as stored.
    #[serde(default)]
    pub phrases: Vec<PhraseRule>,
    #[serde(default)]
    pub is_permanent: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl BlacklistRule {
    pub fn permanent(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            min_confidence: 1.0,
            requires_cashtag: false,
            requires_price_context: false,
            phrases: Vec::new(),
            is_permanent: true,
            notes: None,
        }
    }

    pub fn conditional(symbol: impl Into<String>, min_confidence: f64) -> Self {
        Self {
            symbol: symbol.into(),
            min_confidence,
            requires_cashtag: false,
            requires_price_context: false,
            phrases: Vec::new(),
            is_permanent: false,
            notes: None,
        }
    }

    pub fn requiring_cashtag(mut self) -> Self {
        self.requires_cashtag = true;
        self
    }

    pub fn requiring_price_context(mut self) -> Self {
        self.requires_price_context = true;
        self
    }

    pub fn with_phrase(mut self, phrase: PhraseRule) -> Self {
        self.phrases.push(phrase);
        self
    }

    pub fn required_phrases(&self) -> impl Iterator<Item = &PhraseRule> {
        self.phrases.iter().filter(|p| p.kind == PhraseKind::Required)
    }

    pub fn excluded_phrases(&self) -> impl Iterator<Item = &PhraseRule> {
        self.phrases.iter().filter(|p| p.kind == PhraseKind::Excluded)
    }
}

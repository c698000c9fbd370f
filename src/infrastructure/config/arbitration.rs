use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// External arbitration settings. API keys are only ever read from
/// `ANTHROPIC_API_KEY` / `OPENAI_API_KEY`, never from the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArbitrationConfig {
    #[serde(default)]
    pub provider: ArbitrationProvider,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArbitrationProvider {
    #[default]
    None,
    Anthropic,
    OpenAi,
}

impl ArbitrationConfig {
    pub fn api_key(&self) -> Option<String> {
        let var = match self.provider {
            ArbitrationProvider::None => return None,
            ArbitrationProvider::Anthropic => "ANTHROPIC_API_KEY",
            ArbitrationProvider::OpenAi => "OPENAI_API_KEY",
        };
        std::env::var(var).ok().filter(|k| !k.trim().is_empty())
    }
}

impl fmt::Display for ArbitrationProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArbitrationProvider::None => write!(f, "none"),
            ArbitrationProvider::Anthropic => write!(f, "anthropic"),
            ArbitrationProvider::OpenAi => write!(f, "openai"),
        }
    }
}

impl FromStr for ArbitrationProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" | "disabled" | "" => Ok(ArbitrationProvider::None),
            "anthropic" => Ok(ArbitrationProvider::Anthropic),
            "openai" => Ok(ArbitrationProvider::OpenAi),
            _ => Err(format!("Unknown arbitration provider: {s}")),
        }
    }
}

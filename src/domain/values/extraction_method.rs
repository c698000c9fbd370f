use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a candidate was pulled out of the message text.
///
/// Variants are declared in extraction priority order; when two rules capture
/// the same symbol with equal base confidence, the earlier variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Cashtag,
    AllCaps,
    MixedCaseCashtag,
    SingleLetterCashtag,
    PriceTargetPhrase,
    MixedCase,
}

impl ExtractionMethod {
    pub fn base_confidence(&self) -> f64 {
        match self {
            ExtractionMethod::Cashtag => 0.95,
            ExtractionMethod::AllCaps => 0.60,
            ExtractionMethod::MixedCaseCashtag => 0.85,
            ExtractionMethod::SingleLetterCashtag => 0.90,
            ExtractionMethod::PriceTargetPhrase => 0.75,
            ExtractionMethod::MixedCase => 0.30,
        }
    }

    /// True for every method that required a `$` prefix.
    pub fn is_cashtag_derived(&self) -> bool {
        matches!(
            self,
            ExtractionMethod::Cashtag
                | ExtractionMethod::MixedCaseCashtag
                | ExtractionMethod::SingleLetterCashtag
        )
    }

    /// Minimum score once trader context is present, if the method has one.
    pub fn context_floor(&self) -> Option<f64> {
        match self {
            ExtractionMethod::AllCaps | ExtractionMethod::PriceTargetPhrase => Some(0.85),
            ExtractionMethod::MixedCase => Some(0.70),
            _ => None,
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMethod::Cashtag => write!(f, "cashtag"),
            ExtractionMethod::AllCaps => write!(f, "all_caps"),
            ExtractionMethod::MixedCaseCashtag => write!(f, "mixed_case_cashtag"),
            ExtractionMethod::SingleLetterCashtag => write!(f, "single_letter_cashtag"),
            ExtractionMethod::PriceTargetPhrase => write!(f, "price_target_phrase"),
            ExtractionMethod::MixedCase => write!(f, "mixed_case"),
        }
    }
}

impl FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "cashtag" => Ok(ExtractionMethod::Cashtag),
            "all_caps" => Ok(ExtractionMethod::AllCaps),
            "mixed_case_cashtag" => Ok(ExtractionMethod::MixedCaseCashtag),
            "single_letter_cashtag" => Ok(ExtractionMethod::SingleLetterCashtag),
            "price_target_phrase" => Ok(ExtractionMethod::PriceTargetPhrase),
            "mixed_case" => Ok(ExtractionMethod::MixedCase),
            _ => Err(format!("Unknown extraction method: {s}")),
        }
    }
}

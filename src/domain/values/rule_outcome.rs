use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a scored candidate ended up accepted or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleOutcome {
    Accepted,
    BelowThreshold,
    Blacklisted { reason: String },
    PermanentBlacklist,
    ArbitrationRejected,
}

impl RuleOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, RuleOutcome::Accepted)
    }
}

impl fmt::Display for RuleOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleOutcome::Accepted => write!(f, "accepted"),
            RuleOutcome::BelowThreshold => write!(f, "below_threshold"),
            RuleOutcome::Blacklisted { reason } => write!(f, "blacklisted: {reason}"),
            RuleOutcome::PermanentBlacklist => write!(f, "permanent_blacklist"),
            RuleOutcome::ArbitrationRejected => write!(f, "arbitration_rejected"),
        }
    }
}

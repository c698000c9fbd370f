use serde::{Deserialize, Serialize};

/// A listed instrument. Used to validate and tag detections, never to
/// originate one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub symbol: String,
    pub venue: String,
    pub security_class: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub name: Option<String>,
}

fn default_active() -> bool {
    true
}

use crate::application::settings::EngineSettings;
use crate::domain::entities::reference_entry::ReferenceEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::reference_registry::ReferenceRegistry;
use crate::domain::values::confidence::Confidence;
use crate::domain::values::symbol::base_symbol;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub enum RegistryMatch {
    /// Active on an allowed venue and class.
    Listed { venue: String },
    /// Unknown, inactive, or on a venue/class outside the allowed lists.
    NotListed,
    Unavailable,
}

impl RegistryMatch {
    pub fn venue(&self) -> Option<&str> {
        match self {
            RegistryMatch::Listed { venue } => Some(venue.as_str()),
            _ => None,
        }
    }

    pub fn is_listed(&self) -> bool {
        matches!(self, RegistryMatch::Listed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RegistryCrossCheck {
    settings: EngineSettings,
}

impl RegistryCrossCheck {
    pub fn new(settings: EngineSettings) -> Self {
        Self { settings }
    }

    pub fn check(&self, symbol: &str, registry: &dyn ReferenceRegistry) -> RegistryMatch {
        match self.find(symbol, registry) {
            Ok(Some(entry)) if self.is_allowed(&entry) => RegistryMatch::Listed { venue: entry.venue },
            Ok(_) => RegistryMatch::NotListed,
            Err(e) => {
                debug!(symbol, error = %e, "registry cross-check skipped");
                RegistryMatch::Unavailable
            }
        }
    }

    /// Confidence after the listing boost, capped at 1.0.
    pub fn apply(&self, confidence: f64, registry_match: &RegistryMatch) -> f64 {
        if registry_match.is_listed() {
            Confidence::clamped(confidence + self.settings.registry_boost).value()
        } else {
            confidence
        }
    }

    fn find(
        &self,
        symbol: &str,
        registry: &dyn ReferenceRegistry,
    ) -> Result<Option<ReferenceEntry>, DomainError> {
        match registry.lookup(symbol)? {
            Some(entry) => Ok(Some(entry)),
            None if base_symbol(symbol) != symbol => registry.lookup(base_symbol(symbol)),
            None => Ok(None),
        }
    }

    fn is_allowed(&self, entry: &ReferenceEntry) -> bool {
        entry.is_active
            && self
                .settings
                .allowed_venues
                .iter()
                .any(|v| v.eq_ignore_ascii_case(&entry.venue))
            && self
                .settings
                .allowed_classes
                .iter()
                .any(|c| c.eq_ignore_ascii_case(&entry.security_class))
    }
}

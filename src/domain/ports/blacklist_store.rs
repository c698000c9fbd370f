use crate::domain::entities::blacklist_rule::BlacklistRule;
use crate::domain::error::DomainError;

/// Per-symbol override rules. Writes are operator tooling and live on the
/// concrete store, not on this port.
pub trait BlacklistStore: Send + Sync {
    fn get_rule(&self, symbol: &str) -> Result<Option<BlacklistRule>, DomainError>;
    fn all_rules(&self) -> Result<Vec<BlacklistRule>, DomainError>;
}

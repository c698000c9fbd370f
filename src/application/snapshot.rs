//! Versioned, immutable view of blacklist rules and the reference registry.
//! One snapshot is shared for a whole processing pass.

use crate::domain::entities::blacklist_rule::BlacklistRule;
use crate::domain::entities::reference_entry::ReferenceEntry;
use crate::domain::error::DomainError;
use crate::domain::ports::blacklist_store::BlacklistStore;
use crate::domain::ports::reference_registry::ReferenceRegistry;
use crate::domain::values::symbol::base_symbol;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RuleSnapshot {
    pub version: u64,
    pub loaded_at: DateTime<Utc>,
    rules: HashMap<String, BlacklistRule>,
    /// `None` when the registry could not be loaded.
    registry: Option<HashMap<String, ReferenceEntry>>,
}

impl RuleSnapshot {
    pub fn new(
        version: u64,
        rules: Vec<BlacklistRule>,
        registry: Option<Vec<ReferenceEntry>>,
    ) -> Self {
        Self {
            version,
            loaded_at: Utc::now(),
            rules: rules.into_iter().map(|r| (r.symbol.clone(), r)).collect(),
            registry: registry.map(|entries| {
                entries
                    .into_iter()
                    .map(|e| (e.symbol.clone(), e))
                    .collect()
            }),
        }
    }

    /// Read both stores. A rule store failure is fatal, a registry failure
    /// only disables the cross-check.
    pub fn load(
        version: u64,
        rules: &dyn BlacklistStore,
        registry: &dyn ReferenceRegistry,
    ) -> Result<Self, DomainError> {
        let rules = rules.all_rules()?;
        let registry = match registry.all_entries() {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(error = %e, "reference registry unavailable, cross-check disabled");
                None
            }
        };
        Ok(Self::new(version, rules, registry))
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn registry_available(&self) -> bool {
        self.registry.is_some()
    }

    /// Rule for `symbol`, falling back to its base symbol for class shares.
    pub fn rule_for(&self, symbol: &str) -> Option<&BlacklistRule> {
        self.rules
            .get(symbol)
            .or_else(|| self.rules.get(base_symbol(symbol)))
    }
}

impl BlacklistStore for RuleSnapshot {
    fn get_rule(&self, symbol: &str) -> Result<Option<BlacklistRule>, DomainError> {
        Ok(self.rule_for(symbol).cloned())
    }

    fn all_rules(&self) -> Result<Vec<BlacklistRule>, DomainError> {
        let mut rules: Vec<BlacklistRule> = self.rules.values().cloned().collect();
        rules.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(rules)
    }
}

impl ReferenceRegistry for RuleSnapshot {
    fn lookup(&self, symbol: &str) -> Result<Option<ReferenceEntry>, DomainError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| DomainError::RegistryUnavailable("not loaded".into()))?;
        Ok(registry.get(symbol).cloned())
    }

    fn all_entries(&self) -> Result<Vec<ReferenceEntry>, DomainError> {
        let registry = self
            .registry
            .as_ref()
            .ok_or_else(|| DomainError::RegistryUnavailable("not loaded".into()))?;
        let mut entries: Vec<ReferenceEntry> = registry.values().cloned().collect();
        entries.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        Ok(entries)
    }
}

/// Holder for the current snapshot. Readers clone the `Arc` and keep it for
/// the rest of their pass; a reload swaps in a new version.
pub struct SnapshotCell {
    current: RwLock<Arc<RuleSnapshot>>,
}

impl SnapshotCell {
    pub fn new(snapshot: RuleSnapshot) -> Self {
        Self {
            current: RwLock::new(Arc::new(snapshot)),
        }
    }

    pub fn current(&self) -> Result<Arc<RuleSnapshot>, DomainError> {
        let guard = self
            .current
            .read()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        Ok(Arc::clone(&guard))
    }

    pub fn reload(
        &self,
        rules: &dyn BlacklistStore,
        registry: &dyn ReferenceRegistry,
    ) -> Result<Arc<RuleSnapshot>, DomainError> {
        let next_version = self.current()?.version + 1;
        let snapshot = Arc::new(RuleSnapshot::load(next_version, rules, registry)?);
        let mut guard = self
            .current
            .write()
            .map_err(|e| DomainError::Database(e.to_string()))?;
        *guard = Arc::clone(&snapshot);
        info!(
            version = snapshot.version,
            rules = snapshot.rule_count(),
            registry = snapshot.registry_available(),
            "rule snapshot reloaded"
        );
        Ok(snapshot)
    }
}

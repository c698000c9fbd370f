use crate::domain::entities::reference_entry::ReferenceEntry;
use crate::domain::error::DomainError;

/// Read-only lookup of listed instruments.
pub trait ReferenceRegistry: Send + Sync {
    fn lookup(&self, symbol: &str) -> Result<Option<ReferenceEntry>, DomainError>;
    fn all_entries(&self) -> Result<Vec<ReferenceEntry>, DomainError>;
}

use crate::domain::entities::arbitration_record::ArbitrationRecord;
use crate::domain::error::DomainError;

pub trait ArbitrationLog: Send + Sync {
    fn record_verdict(&self, record: &ArbitrationRecord) -> Result<(), DomainError>;
    fn recent(&self, symbol: Option<&str>, limit: usize) -> Result<Vec<ArbitrationRecord>, DomainError>;
}

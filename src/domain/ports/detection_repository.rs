use crate::domain::entities::detection::Detection;
use crate::domain::error::DomainError;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Default)]
pub struct DetectionFilter {
    pub symbol: Option<String>,
    pub message_id: Option<String>,
    /// Inclusive lower bound on `observed_at`.
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `observed_at`.
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

pub trait DetectionRepository: Send + Sync {
    /// Insert a detection. Returns `Ok(false)` when the
    /// (`message_id`, `symbol`, `position`) key already exists.
    fn record(&self, detection: &Detection) -> Result<bool, DomainError>;
    fn query(&self, filter: &DetectionFilter) -> Result<Vec<Detection>, DomainError>;
    fn count(&self) -> Result<usize, DomainError>;
}

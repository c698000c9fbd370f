use crate::domain::entities::daily_rollup::DailyRollup;
use crate::domain::error::DomainError;
use chrono::NaiveDate;

pub trait RollupRepository: Send + Sync {
    /// Replace every stored row for `date` with `rollups`.
    fn replace_day(&self, date: NaiveDate, rollups: &[DailyRollup]) -> Result<(), DomainError>;
    fn for_day(&self, date: NaiveDate, limit: Option<usize>) -> Result<Vec<DailyRollup>, DomainError>;
}

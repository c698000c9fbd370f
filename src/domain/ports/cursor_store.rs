use crate::domain::entities::cursor::{CursorDelta, ProcessingCursor};
use crate::domain::error::DomainError;
use crate::domain::values::cursor_pointer::CursorPointer;

pub trait CursorStore: Send + Sync {
    fn load(&self, source_id: &str) -> Result<Option<ProcessingCursor>, DomainError>;

    /// Move the pointer forward and add `delta` to the counters. A pointer
    /// that is not later than the stored one leaves the pointer unchanged.
    /// Returns whether the pointer moved.
    fn advance(
        &self,
        source_id: &str,
        pointer: &CursorPointer,
        delta: CursorDelta,
    ) -> Result<bool, DomainError>;

    fn list(&self) -> Result<Vec<ProcessingCursor>, DomainError>;
}

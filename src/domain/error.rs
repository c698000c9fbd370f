use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(String),

    /// The store cannot be reached at all. This is the only error that halts a pass.
    #[error("Persistence unavailable: {0}")]
    PersistenceUnavailable(String),

    #[error("Reference registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("Arbitration error: {0}")]
    Arbitration(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    pub fn halts_pass(&self) -> bool {
        matches!(self, DomainError::PersistenceUnavailable(_))
    }
}

impl From<String> for DomainError {
    fn from(s: String) -> Self {
        DomainError::Database(s)
    }
}

impl From<&str> for DomainError {
    fn from(s: &str) -> Self {
        DomainError::InvalidInput(s.to_string())
    }
}

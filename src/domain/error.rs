use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Degenerate vector: norm is zero, direction undefined")]
    DegenerateVector,

    #[error("Non-finite component at index {index}")]
    NonFiniteComponent { index: usize },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Repository unavailable after {attempts} attempts: {last_error}")]
    RepositoryUnavailable { attempts: u32, last_error: String },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Arity mismatch: {payloads} payloads but {metadata} metadata entries")]
    ArityMismatch { payloads: usize, metadata: usize },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Encoder error: {0}")]
    Encoder(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// True for failures of the remote store, as opposed to caller or encoder errors.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            DomainError::Connection(_)
                | DomainError::RepositoryUnavailable { .. }
                | DomainError::Store(_)
        )
    }
}

impl From<&str> for DomainError {
    fn from(s: &str) -> Self {
        DomainError::InvalidInput(s.to_string())
    }
}

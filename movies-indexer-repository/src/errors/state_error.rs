use thiserror::Error;

#[derive(Debug, Error)]
/// Represents errors that can occur while persisting watermarks.
pub enum StateError {
    #[error("State I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("State serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

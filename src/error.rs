use thiserror::Error;

/// Error kinds from spec §7. Only `Configuration` and `Invariant` are
/// fatal to the process; everything else is handled at the call site.
#[derive(Error, Debug)]
pub enum SsamError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("proof-of-work nonce space exhausted")]
    Exhaustion,

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SsamError>;

// lib/src/errors.rs

use thiserror::Error;

use bincode::error::{DecodeError, EncodeError};
use models::{ScheduleTransitionError, ValidationError};
use sled::transaction::TransactionError;

#[derive(Debug, Error)]
pub enum NeoCareError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Already Exists: {0}")]
    AlreadyExists(String),

    /// Concurrent writers collided; the caller may retry.
    #[error("Conflict, please retry: {0}")]
    Conflict(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Deletion or edit blocked because other records still point at the target.
    #[error("Still referenced: {0}")]
    StillReferenced(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Database operation failed: {0}")]
    DatabaseError(String),

    #[error("Serialization/Deserialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("File I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Bincode decode error: {0}")]
    BincodeDecode(#[from] DecodeError),
    #[error("Bincode encode error: {0}")]
    BincodeEncode(#[from] EncodeError),
}

pub type Result<T> = std::result::Result<T, NeoCareError>;

impl NeoCareError {
    /// True for failures caused by the infrastructure rather than the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            NeoCareError::DatabaseError(_)
                | NeoCareError::SerializationError(_)
                | NeoCareError::ConfigurationError(_)
                | NeoCareError::InternalError(_)
                | NeoCareError::IoError(_)
                | NeoCareError::BincodeDecode(_)
                | NeoCareError::BincodeEncode(_)
        )
    }
}

impl From<sled::Error> for NeoCareError {
    fn from(err: sled::Error) -> Self {
        NeoCareError::DatabaseError(err.to_string())
    }
}

impl From<TransactionError<NeoCareError>> for NeoCareError {
    fn from(err: TransactionError<NeoCareError>) -> Self {
        match err {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(e) => NeoCareError::DatabaseError(e.to_string()),
        }
    }
}

impl From<ScheduleTransitionError> for NeoCareError {
    fn from(err: ScheduleTransitionError) -> Self {
        NeoCareError::InvalidState(err.to_string())
    }
}

impl From<::config::ConfigError> for NeoCareError {
    fn from(err: ::config::ConfigError) -> Self {
        NeoCareError::ConfigurationError(err.to_string())
    }
}

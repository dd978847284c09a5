// security/src/errors.rs
use std::fmt;

use models::ValidationError;
use neocare_lib::NeoCareError;

/// Custom authentication errors.
#[derive(Debug)]
pub enum AuthError {
    UserExists,
    /// Never says which credential was wrong.
    InvalidCredentials,
    MissingToken,
    InvalidToken(String),
    Forbidden(String),
    Validation(ValidationError),
    PasswordHashError(String),
    PolicyError(String),
    Storage(NeoCareError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::UserExists => write!(f, "Username already exists"),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::MissingToken => write!(f, "Missing bearer token"),
            AuthError::InvalidToken(msg) => write!(f, "Invalid or expired token: {}", msg),
            AuthError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AuthError::Validation(e) => write!(f, "Validation failed: {}", e),
            AuthError::PasswordHashError(msg) => write!(f, "Password hashing error: {}", msg),
            AuthError::PolicyError(msg) => write!(f, "Access policy error: {}", msg),
            AuthError::Storage(e) => write!(f, "Storage error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        AuthError::Validation(err)
    }
}

impl From<NeoCareError> for AuthError {
    fn from(err: NeoCareError) -> Self {
        match err {
            NeoCareError::AlreadyExists(_) => AuthError::UserExists,
            NeoCareError::Validation(e) => AuthError::Validation(e),
            NeoCareError::PermissionDenied(msg) => AuthError::Forbidden(msg),
            other => AuthError::Storage(other),
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

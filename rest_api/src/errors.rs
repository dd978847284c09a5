// rest_api/src/errors.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use models::ValidationError;
use neocare_lib::NeoCareError;
use security::AuthError;

const UNAVAILABLE: &str = "Service temporarily unavailable";

#[derive(Debug, Error)]
pub enum RestApiError {
    #[error(transparent)]
    Core(#[from] NeoCareError),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type ApiResult<T> = Result<T, RestApiError>;

impl From<ValidationError> for RestApiError {
    fn from(err: ValidationError) -> Self {
        RestApiError::Core(NeoCareError::Validation(err))
    }
}

fn core_status(err: &NeoCareError) -> StatusCode {
    if err.is_internal() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    match err {
        NeoCareError::Validation(_) => StatusCode::BAD_REQUEST,
        NeoCareError::NotFound(_) => StatusCode::NOT_FOUND,
        NeoCareError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        NeoCareError::AlreadyExists(_)
        | NeoCareError::Conflict(_)
        | NeoCareError::InvalidState(_)
        | NeoCareError::StillReferenced(_) => StatusCode::CONFLICT,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl RestApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            RestApiError::Core(e) => core_status(e),
            RestApiError::Auth(e) => match e {
                AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken(_) => {
                    StatusCode::UNAUTHORIZED
                }
                AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
                AuthError::UserExists => StatusCode::CONFLICT,
                AuthError::Validation(_) => StatusCode::BAD_REQUEST,
                AuthError::Storage(inner) => core_status(inner),
                AuthError::PasswordHashError(_) | AuthError::PolicyError(_) => StatusCode::SERVICE_UNAVAILABLE,
            },
            RestApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RestApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status == StatusCode::SERVICE_UNAVAILABLE {
            error!("Request failed: {}", self);
            UNAVAILABLE.to_string()
        } else {
            self.to_string()
        };
        let body = Json(json!({
            "status": "error",
            "message": message,
        }));
        (status, body).into_response()
    }
}

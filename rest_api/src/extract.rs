// rest_api/src/extract.rs
use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;

use security::{AuthError, RequestContext};

use crate::errors::RestApiError;
use crate::state::AppState;

/// Verified caller built from the `Authorization: Bearer <token>` header.
pub struct Authenticated(pub RequestContext);

#[async_trait]
impl FromRequestParts<AppState> for Authenticated {
    type Rejection = RestApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;
        Ok(Authenticated(state.keys.context_from_token(token)?))
    }
}

/// JSON request body whose rejections use the API error shape.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RestApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| RestApiError::InvalidInput(rejection.body_text()))?;
        Ok(JsonBody(value))
    }
}

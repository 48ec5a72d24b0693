//! Bearer-token identity boundary
//!
//! The identity provider lives outside this service: requests arrive with an
//! `Authorization: Bearer <token>` header already minted upstream, and the
//! token is treated as the opaque, verified user id. Anything without a
//! usable token is rejected before a handler runs.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::Json,
};

use super::responses::{error_response, ErrorResponse};

/// The authenticated user id extracted from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => Ok(AuthUser(token.to_string())),
            None => Err(error_response(
                StatusCode::UNAUTHORIZED,
                "Missing or invalid bearer token",
            )),
        }
    }
}

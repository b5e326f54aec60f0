//! Request extractors.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::auth::bearer_token;
use crate::domain::error::DomainError;
use crate::AppState;

/// JSON body whose rejections come back as a 400 `ErrorResponse`
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(DomainError))]
pub struct AppJson<T>(pub T);

/// Query string extractor with the same rejection contract as [`AppJson`]
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(DomainError))]
pub struct AppQuery<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(DomainError))]
pub struct AppPath<T>(pub T);

/// The authenticated caller, taken from the `Authorization: Bearer` header.
/// Handlers that take this argument reject anonymous requests with 401.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub user_id: String,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = DomainError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| DomainError::unauthorized("Not authenticated"))?;
        let token = bearer_token(header)
            .ok_or_else(|| DomainError::unauthorized("Not authenticated"))?;

        let claims = state.jwt.verify(token)?;

        // Tokens for accounts that no longer exist are rejected
        let user = state
            .user_service
            .get_user(&claims.sub)
            .await
            .map_err(|e| match e {
                DomainError::NotFound(_) => DomainError::unauthorized("Could not validate credentials"),
                other => other,
            })?;

        Ok(AuthUser {
            user_id: user.id,
            username: user.username,
        })
    }
}

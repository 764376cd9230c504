use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication.
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?.ok_or(AppError::TokenMissing)?;
        authenticate(token, state)
    }
}

/// The principal behind an upload or history request.
///
/// Resolves to `None` only when anonymous access is enabled and the request
/// carries no `Authorization` header. A header with a bad token is always
/// rejected.
pub struct Uploader(pub Option<AuthUser>);

impl Uploader {
    /// Owner id used to scope records; `None` is the anonymous owner.
    pub fn owner_id(&self) -> Option<i32> {
        self.0.as_ref().map(|user| user.user_id)
    }
}

impl FromRequestParts<AppState> for Uploader {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts)? {
            Some(token) => Ok(Uploader(Some(authenticate(token, state)?))),
            None if state.config.auth.allow_anonymous => Ok(Uploader(None)),
            None => Err(AppError::TokenMissing),
        }
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(header) = parts.headers.get("Authorization") else {
        return Ok(None);
    };

    let value = header.to_str().map_err(|_| AppError::TokenInvalid)?;
    value
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or(AppError::TokenInvalid)
}

fn authenticate(token: &str, state: &AppState) -> Result<AuthUser, AppError> {
    let claims =
        jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

    Ok(AuthUser {
        user_id: claims.uid,
        username: claims.sub,
    })
}

//! API key authentication extractors.
//!
//! Keys are read from:
//! - `Authorization: Bearer <key>` header
//! - `X-API-Key: <key>` header
//!
//! and resolved to a user through the state's [`AuthProvider`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use askr_core::auth::AuthProvider;
use askr_types::error::AuthError;
use askr_types::user::User;

use crate::http::error::AppError;
use crate::state::AppState;

/// The signed-in user. Extraction fails with 401 when there is none.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = extract_api_key(parts)?;
        let user = state
            .auth
            .current_user(credential.as_deref(), true)
            .await?
            .ok_or(AuthError::Unauthenticated)?;
        Ok(CurrentUser(user))
    }
}

/// The signed-in user, if any. Unknown keys read as anonymous.
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let credential = extract_api_key(parts)?;
        let user = state.auth.current_user(credential.as_deref(), false).await?;
        Ok(MaybeUser(user))
    }
}

/// Extract the API key from request headers.
fn extract_api_key(parts: &Parts) -> Result<Option<String>, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Validation("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(key) = auth_str.strip_prefix("Bearer ") {
            return Ok(Some(key.trim().to_string()));
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key
            .to_str()
            .map_err(|_| AppError::Validation("Invalid X-API-Key header encoding".to_string()))?;
        return Ok(Some(key_str.trim().to_string()));
    }

    Ok(None)
}

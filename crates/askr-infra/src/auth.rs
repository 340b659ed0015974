//! API key authentication.
//!
//! Resolves a presented key to its user by SHA-256 hash lookup.

use askr_core::auth::AuthProvider;
use askr_types::error::AuthError;
use askr_types::user::User;

use crate::sqlite::user::{SqliteUserRepository, hash_api_key};

/// [`AuthProvider`] backed by the `api_keys` table.
#[derive(Clone)]
pub struct ApiKeyAuthProvider {
    users: SqliteUserRepository,
}

impl ApiKeyAuthProvider {
    pub fn new(users: SqliteUserRepository) -> Self {
        Self { users }
    }
}

impl AuthProvider for ApiKeyAuthProvider {
    async fn current_user(
        &self,
        credential: Option<&str>,
        throw_if_unauthenticated: bool,
    ) -> Result<Option<User>, AuthError> {
        let unauthenticated = |err: AuthError| {
            if throw_if_unauthenticated {
                Err(err)
            } else {
                Ok(None)
            }
        };

        let Some(key) = credential.map(str::trim).filter(|k| !k.is_empty()) else {
            return unauthenticated(AuthError::Unauthenticated);
        };

        let user = self
            .users
            .find_user_by_key_hash(&hash_api_key(key))
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?;

        match user {
            Some(user) => Ok(Some(user)),
            None => {
                tracing::debug!("rejected unknown api key");
                unauthenticated(AuthError::InvalidCredentials)
            }
        }
    }
}

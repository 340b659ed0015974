//! Authentication port.

use askr_types::error::AuthError;
use askr_types::user::User;

/// Resolves a request credential to a user.
///
/// Implementations live in askr-infra (e.g., `ApiKeyAuthProvider`).
pub trait AuthProvider: Send + Sync {
    /// Resolve `credential` to the current user.
    ///
    /// With `throw_if_unauthenticated` set, a missing or unknown credential is
    /// an `AuthError`; otherwise it yields `Ok(None)`. Backend failures are
    /// always errors.
    fn current_user(
        &self,
        credential: Option<&str>,
        throw_if_unauthenticated: bool,
    ) -> impl std::future::Future<Output = Result<Option<User>, AuthError>> + Send;
}

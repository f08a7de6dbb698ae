//! Domain service for administrator authentication.
//!
//! Handles login, password changes, and the one-time password-reset flow.
//! Session persistence lives at the HTTP boundary; this service owns the
//! credential checks and the lockout policy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to authentication operations.
///
/// A tagged enum rather than message strings, so callers can branch on the
/// kind and the lockout payload stays structured.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredential,

    #[error("Too many failed attempts, locked for {minutes_remaining} more minutes")]
    LockedOut { minutes_remaining: i64 },

    #[error("No account registered for that address")]
    EmailNotFound,

    #[error("Validation failed: {0}")]
    Validation(String),

    /// Underlying hash primitive failed. Fatal for this call; surfaced
    /// generically so internals do not leak.
    #[error("Hashing failure")]
    Hashing(#[source] anyhow::Error),

    #[error("Database error: {0}")]
    Database(String),
}

/// The authenticated principal, as persisted in the session record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminIdentity {
    pub username: String,
    pub email: String,
}

/// Outcome of a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResult {
    pub identity: AdminIdentity,

    /// Set when the seeded bootstrap credential or a temporary secret was
    /// used; the UI forces rotation.
    pub must_change_password: bool,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Verifies credentials against the primary or temporary hash.
    ///
    /// # Errors
    ///
    /// [`AuthError::LockedOut`] while a lockout window is open, otherwise
    /// [`AuthError::InvalidCredential`] on mismatch. The mismatch that
    /// triggers the lockout already reports [`AuthError::LockedOut`].
    async fn login(&self, username: &str, secret: &str) -> Result<LoginResult, AuthError>;

    /// Replaces the primary credential after verifying the current one
    /// (primary or temporary). Clears any outstanding temporary credential.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredential`] if `current_secret` does
    /// not verify.
    async fn change_password(
        &self,
        current_secret: &str,
        new_secret: &str,
    ) -> Result<(), AuthError>;

    /// Issues a new temporary credential for the registered recovery
    /// address, replacing any prior one. Returns the plaintext secret for
    /// one-time display.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailNotFound`] if the address does not match.
    async fn reset_password(&self, email: &str) -> Result<String, AuthError>;

    /// The configured administrator identity.
    fn identity(&self) -> AdminIdentity;
}

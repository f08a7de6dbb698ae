//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::config::{AdminConfig, SecurityConfig};
use crate::db::Store;
use crate::services::auth_service::{AdminIdentity, AuthError, AuthService, LoginResult};
use crate::services::lockout::LockoutState;
use crate::services::password;

pub struct SeaOrmAuthService {
    store: Store,
    identity: AdminConfig,
    security: SecurityConfig,

    /// Owned by the service instance, not module state, so the counter has
    /// an explicit lifecycle and is unit-testable.
    lockout: Mutex<LockoutState>,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(store: Store, identity: AdminConfig, security: SecurityConfig) -> Self {
        Self {
            store,
            identity,
            security,
            lockout: Mutex::new(LockoutState::default()),
        }
    }

    fn check_lockout(&self) -> Result<(), AuthError> {
        let now = Utc::now();
        let mut state = self.lockout.lock().expect("lockout mutex poisoned");

        if state.is_locked(now) {
            return Err(AuthError::LockedOut {
                minutes_remaining: state.minutes_remaining(now),
            });
        }

        Ok(())
    }

    /// Record a failed attempt. The failure that trips the threshold
    /// already answers with the lockout, not a plain credential error.
    fn record_failure(&self) -> AuthError {
        let now = Utc::now();
        let mut state = self.lockout.lock().expect("lockout mutex poisoned");

        state.record_failure(now, &self.security.lockout);

        if state.is_locked(now) {
            AuthError::LockedOut {
                minutes_remaining: state.minutes_remaining(now),
            }
        } else {
            AuthError::InvalidCredential
        }
    }

    fn reset_lockout(&self) {
        self.lockout
            .lock()
            .expect("lockout mutex poisoned")
            .reset();
    }

    /// Verify a secret against the primary hash, falling back to the single
    /// outstanding temporary hash. Returns whether the temporary credential
    /// was the one that matched.
    async fn verify_secret(
        &self,
        secret: &str,
        primary_hash: &str,
        temp_hash: Option<&str>,
    ) -> Result<Option<bool>, AuthError> {
        if password::verify(secret, primary_hash)
            .await
            .map_err(AuthError::Hashing)?
        {
            return Ok(Some(false));
        }

        if let Some(temp) = temp_hash
            && password::verify(secret, temp)
                .await
                .map_err(AuthError::Hashing)?
        {
            return Ok(Some(true));
        }

        Ok(None)
    }

    async fn admin_row(&self) -> Result<crate::entities::admin::Model, AuthError> {
        self.store
            .get_admin()
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?
            .ok_or_else(|| AuthError::Database("Admin row missing".to_string()))
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn login(&self, username: &str, secret: &str) -> Result<LoginResult, AuthError> {
        self.check_lockout()?;

        // Exact, case-sensitive match against the configured username.
        if username != self.identity.username {
            return Err(self.record_failure());
        }

        let row = self.admin_row().await?;

        let used_temp = match self
            .verify_secret(secret, &row.password_hash, row.temp_password_hash.as_deref())
            .await?
        {
            Some(used_temp) => used_temp,
            None => return Err(self.record_failure()),
        };

        // Temporary credentials are one-shot: erase before reporting success.
        if used_temp {
            self.store
                .clear_admin_temp_password_hash()
                .await
                .map_err(|e| AuthError::Database(e.to_string()))?;
        }

        self.reset_lockout();

        tracing::info!(username = %row.username, used_temp, "Administrator logged in");

        Ok(LoginResult {
            identity: AdminIdentity {
                username: row.username,
                email: row.email,
            },
            must_change_password: row.must_change_password || used_temp,
        })
    }

    async fn change_password(
        &self,
        current_secret: &str,
        new_secret: &str,
    ) -> Result<(), AuthError> {
        if new_secret.len() < 8 {
            return Err(AuthError::Validation(
                "New password must be at least 8 characters".to_string(),
            ));
        }

        if current_secret == new_secret {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let row = self.admin_row().await?;

        if self
            .verify_secret(
                current_secret,
                &row.password_hash,
                row.temp_password_hash.as_deref(),
            )
            .await?
            .is_none()
        {
            return Err(AuthError::InvalidCredential);
        }

        let new_hash = password::hash(new_secret, &self.security)
            .await
            .map_err(AuthError::Hashing)?;

        // Single update: replaces the primary hash and erases any
        // outstanding temporary credential together.
        self.store
            .set_admin_password_hash(&new_hash)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        tracing::info!("Administrator password changed");

        Ok(())
    }

    async fn reset_password(&self, email: &str) -> Result<String, AuthError> {
        if email != self.identity.email {
            return Err(AuthError::EmailNotFound);
        }

        let temp_secret = password::generate_temp_secret();
        let temp_hash = password::hash(&temp_secret, &self.security)
            .await
            .map_err(AuthError::Hashing)?;

        // Overwrites any prior temporary credential; at most one exists.
        self.store
            .set_admin_temp_password_hash(&temp_hash)
            .await
            .map_err(|e| AuthError::Database(e.to_string()))?;

        tracing::info!("Temporary credential issued for password reset");

        Ok(temp_secret)
    }

    fn identity(&self) -> AdminIdentity {
        AdminIdentity {
            username: self.identity.username.clone(),
            email: self.identity.email.clone(),
        }
    }
}

//! One-way password hashing and temporary-secret generation.
//!
//! Argon2id with a fresh random salt per call. Hashing and verification are
//! CPU-intensive, so the async wrappers run them under `spawn_blocking`.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;
use crate::constants::auth::{TEMP_SECRET_DIGITS, TEMP_SECRET_PREFIX};

fn build_argon2(config: &SecurityConfig) -> Result<Argon2<'static>> {
    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a secret using Argon2id with the configured cost parameters.
pub fn hash_password(secret: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = build_argon2(config)?;

    let hash = argon2
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Verify a secret against a stored hash. The cost parameters are encoded
/// in the hash string itself, so no config is needed here.
pub fn verify_password(secret: &str, digest: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(digest).map_err(|e| anyhow::anyhow!("Invalid password hash: {e}"))?;

    Ok(Argon2::default()
        .verify_password(secret.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Async wrapper around [`hash_password`].
pub async fn hash(secret: &str, config: &SecurityConfig) -> Result<String> {
    let secret = secret.to_string();
    let config = config.clone();

    task::spawn_blocking(move || hash_password(&secret, &config))
        .await
        .context("Password hashing task panicked")?
}

/// Async wrapper around [`verify_password`].
pub async fn verify(secret: &str, digest: &str) -> Result<bool> {
    let secret = secret.to_string();
    let digest = digest.to_string();

    task::spawn_blocking(move || verify_password(&secret, &digest))
        .await
        .context("Password verification task panicked")?
}

/// Generate a human-typable temporary secret: a fixed prefix plus six
/// random digits, e.g. `reset-042917`.
#[must_use]
pub fn generate_temp_secret() -> String {
    use rand::Rng;

    let upper = 10u32.pow(TEMP_SECRET_DIGITS);
    let suffix = rand::rng().random_range(0..upper);

    format!(
        "{TEMP_SECRET_PREFIX}{suffix:0width$}",
        width = TEMP_SECRET_DIGITS as usize
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // Minimal Argon2 cost so the test suite stays fast.
    fn test_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 64,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
            ..SecurityConfig::default()
        }
    }

    #[test]
    fn test_hash_then_verify_round_trip() {
        let config = test_config();
        let digest = hash_password("hunter2", &config).unwrap();

        assert!(verify_password("hunter2", &digest).unwrap());
        assert!(!verify_password("hunter3", &digest).unwrap());
    }

    #[test]
    fn test_hash_is_salted() {
        let config = test_config();
        let a = hash_password("hunter2", &config).unwrap();
        let b = hash_password("hunter2", &config).unwrap();

        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_malformed_digest() {
        assert!(verify_password("hunter2", "not-a-phc-string").is_err());
    }

    #[test]
    fn test_temp_secret_shape() {
        let secret = generate_temp_secret();

        assert!(secret.starts_with(TEMP_SECRET_PREFIX));
        let suffix = &secret[TEMP_SECRET_PREFIX.len()..];
        assert_eq!(suffix.len(), TEMP_SECRET_DIGITS as usize);
        assert!(suffix.chars().all(|c| c.is_ascii_digit()));
    }
}

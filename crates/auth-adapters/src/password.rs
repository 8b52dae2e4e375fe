//! Argon2id implementation of `PasswordHasher`.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use tokio::task;

use domains::{DomainError, PasswordHasher, Result};

/// Hashing runs on the blocking pool; Argon2 is deliberately slow.
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PasswordHasher for Argon2Hasher {
    async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_owned();
        task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(DomainError::storage)
        })
        .await
        .map_err(DomainError::storage)?
    }

    /// A stored hash that does not parse counts as a mismatch.
    async fn verify(&self, password: &str, hash: &str) -> Result<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        task::spawn_blocking(move || {
            let Ok(parsed) = PasswordHash::new(&hash) else {
                tracing::warn!("stored password hash is not a valid PHC string");
                return false;
            };
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .await
        .map_err(DomainError::storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("password123").await.unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("password123", &hash).await.unwrap());
        assert!(!hasher.verify("password124", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_fresh_salt() {
        let hasher = Argon2Hasher::new();
        let a = hasher.hash("password123").await.unwrap();
        let b = hasher.hash("password123").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn garbage_hash_never_verifies() {
        let hasher = Argon2Hasher::new();
        assert!(!hasher.verify("password123", "not-a-hash").await.unwrap());
    }
}

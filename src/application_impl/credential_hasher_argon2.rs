use crate::application_port::{AuthError, CredentialHasher};
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

/// Argon2id with cost parameters taken from settings.
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AuthError::InternalError(format!("argon2 params: {e}")))?;
        Ok(Argon2PasswordHasher {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| AuthError::InternalError(e.to_string()))
        })
        .await
        .map_err(|e| AuthError::InternalError(e.to_string()))?
    }

    async fn verify_password(&self, password: &str, password_hash: &str) -> bool {
        let argon2 = self.argon2.clone();
        let password = password.to_owned();
        let password_hash = password_hash.to_owned();
        let verified = tokio::task::spawn_blocking(move || {
            let parsed = match PasswordHash::new(&password_hash) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!("stored password hash is not a valid PHC string: {e}");
                    return false;
                }
            };
            // cost parameters are read from the PHC string, not from `argon2`
            argon2.verify_password(password.as_bytes(), &parsed).is_ok()
        })
        .await;

        verified.unwrap_or_else(|e| {
            tracing::error!("password verification task failed: {e}");
            false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> Argon2PasswordHasher {
        Argon2PasswordHasher::new(1024, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = hasher();
        let hash = hasher.hash_password("correct horse").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify_password("correct horse", &hash).await);
        assert!(!hasher.verify_password("battery staple", &hash).await);
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let hasher = hasher();
        let a = hasher.hash_password("password123").await.unwrap();
        let b = hasher.hash_password("password123").await.unwrap();
        assert_ne!(a, b);
        assert!(hasher.verify_password("password123", &a).await);
        assert!(hasher.verify_password("password123", &b).await);
    }

    #[tokio::test]
    async fn malformed_hash_never_verifies() {
        assert!(!hasher().verify_password("password123", "not-a-hash").await);
        assert!(!hasher().verify_password("password123", "").await);
    }

    #[test]
    fn rejects_impossible_cost() {
        assert!(Argon2PasswordHasher::new(1, 1, 1).is_err());
    }
}

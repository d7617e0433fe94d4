use super::*;
use crate::application_port::{AccessGuard, AuthService};
use crate::domain_port::{RevocationStore, StoreError};
use crate::infra_memory::InMemoryUserRepo;
use std::sync::Arc;
use std::time::Duration;

pub fn test_jwt_config() -> JwtConfig {
    JwtConfig {
        issuer: "strongbox-test".to_string(),
        audience: "strongbox-test-clients".to_string(),
        access_ttl: Duration::from_secs(900),
        refresh_ttl: Duration::from_secs(604_800),
        access_secret: b"access-secret-access-secret-access-secret".to_vec(),
        refresh_secret: b"refresh-secret-refresh-secret-refresh-secret".to_vec(),
    }
}

/// Auth service over in-memory users, a cheap hasher and `store`, with a device
/// cap of five.
pub fn test_auth_service(
    store: Arc<dyn RevocationStore>,
) -> (Arc<dyn AuthService>, Arc<dyn AccessGuard>) {
    let cfg = test_jwt_config();
    let refresh_ttl_secs = cfg.refresh_ttl.as_secs();
    let codec = Arc::new(JwtHs512Codec::new(cfg));
    let guard: Arc<dyn AccessGuard> = Arc::new(DenylistAccessGuard::new(codec.clone(), store.clone()));
    let sessions = Arc::new(StoreRefreshSessionManager::new(store, 5, refresh_ttl_secs));
    let hasher = Arc::new(Argon2PasswordHasher::new(1024, 1, 1).expect("argon2 params"));
    let auth = Arc::new(RealAuthService::new(
        Arc::new(InMemoryUserRepo::new()),
        hasher,
        codec,
        sessions,
        guard.clone(),
    ));
    (auth, guard)
}

/// A revocation store whose every call fails as if the server were down.
pub struct FailingStore;

fn down<T>() -> Result<T, StoreError> {
    Err(StoreError::Unavailable("connection refused".to_string()))
}

#[async_trait::async_trait]
impl RevocationStore for FailingStore {
    async fn put_with_ttl(&self, _: &str, _: &str, _: u64) -> Result<(), StoreError> {
        down()
    }
    async fn get(&self, _: &str) -> Result<Option<String>, StoreError> {
        down()
    }
    async fn take(&self, _: &str) -> Result<Option<String>, StoreError> {
        down()
    }
    async fn delete(&self, _: &str) -> Result<(), StoreError> {
        down()
    }
    async fn exists(&self, _: &str) -> Result<bool, StoreError> {
        down()
    }
    async fn add_to_set(&self, _: &str, _: &str, _: u64) -> Result<(), StoreError> {
        down()
    }
    async fn members_of(&self, _: &str) -> Result<Vec<String>, StoreError> {
        down()
    }
    async fn remove_from_set(&self, _: &str, _: &str) -> Result<(), StoreError> {
        down()
    }
    async fn ping(&self) -> Result<(), StoreError> {
        down()
    }
}

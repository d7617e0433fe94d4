use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
}

/// Key-value store with TTLs and small ordered collections, shared by every
/// instance of the service.
///
/// Keys are logical; implementations may namespace them. "Sets" keep insertion
/// order and may hold duplicates only if the caller adds them twice.
#[async_trait::async_trait]
pub trait RevocationStore: Send + Sync {
    async fn put_with_ttl(&self, key: &str, value: &str, ttl_secs: u64)
    -> Result<(), StoreError>;
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Atomically reads and deletes `key`. Of several concurrent callers at most
    /// one observes the value.
    async fn take(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
    async fn exists(&self, key: &str) -> Result<bool, StoreError>;
    /// Appends `member` and pushes the collection's own expiry out to `ttl_secs`.
    async fn add_to_set(&self, set_key: &str, member: &str, ttl_secs: u64)
    -> Result<(), StoreError>;
    /// Members in insertion order, oldest first.
    async fn members_of(&self, set_key: &str) -> Result<Vec<String>, StoreError>;
    async fn remove_from_set(&self, set_key: &str, member: &str) -> Result<(), StoreError>;
    async fn ping(&self) -> Result<(), StoreError>;
}

impl From<StoreError> for crate::application_port::AuthError {
    fn from(err: StoreError) -> Self {
        crate::application_port::AuthError::Store(err.to_string())
    }
}

use crate::domain_port::*;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl_secs: u64) -> Self {
        Expiring {
            value,
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        }
    }

    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

/// Process-local [`RevocationStore`]. Expired entries are dropped on access, and
/// writes sweep the whole store at most once per [`SWEEP_INTERVAL`].
/// Only suitable for a single instance (development, tests).
pub struct InMemoryRevocationStore {
    values: DashMap<String, Expiring<String>>,
    sets: DashMap<String, Expiring<Vec<String>>>,
    started: Instant,
    last_sweep_ms: AtomicU64,
}

impl Default for InMemoryRevocationStore {
    fn default() -> Self {
        InMemoryRevocationStore {
            values: DashMap::new(),
            sets: DashMap::new(),
            started: Instant::now(),
            last_sweep_ms: AtomicU64::new(0),
        }
    }
}

impl InMemoryRevocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Must not be called while holding a reference into either map.
    fn sweep_if_due(&self) {
        let now_ms = self.started.elapsed().as_millis() as u64;
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        if now_ms.saturating_sub(last) < SWEEP_INTERVAL.as_millis() as u64 {
            return;
        }
        // one writer wins the sweep
        if self
            .last_sweep_ms
            .compare_exchange(last, now_ms, Ordering::Relaxed, Ordering::Relaxed)
            .is_err()
        {
            return;
        }
        self.values.retain(|_, entry| entry.is_live());
        self.sets.retain(|_, entry| entry.is_live());
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.values.len() + self.sets.len()
    }
}

#[async_trait::async_trait]
impl RevocationStore for InMemoryRevocationStore {
    async fn put_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        self.sweep_if_due();
        self.values
            .insert(key.to_string(), Expiring::new(value.to_string(), ttl_secs));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .values
            .get(key)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value.clone());
        if value.is_none() {
            self.values.remove_if(key, |_, entry| !entry.is_live());
        }
        Ok(value)
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self
            .values
            .remove(key)
            .filter(|(_, entry)| entry.is_live())
            .map(|(_, entry)| entry.value))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        self.sets.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key).await?.is_some())
    }

    async fn add_to_set(
        &self,
        set_key: &str,
        member: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        self.sweep_if_due();
        let mut entry = self
            .sets
            .entry(set_key.to_string())
            .or_insert_with(|| Expiring::new(Vec::new(), ttl_secs));
        if !entry.is_live() {
            entry.value.clear();
        }
        entry.value.push(member.to_string());
        entry.expires_at = Instant::now() + Duration::from_secs(ttl_secs);
        Ok(())
    }

    async fn members_of(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .sets
            .get(set_key)
            .filter(|entry| entry.is_live())
            .map(|entry| entry.value.clone())
            .unwrap_or_default())
    }

    async fn remove_from_set(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        if let Some(mut entry) = self.sets.get_mut(set_key) {
            entry.value.retain(|m| m != member);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

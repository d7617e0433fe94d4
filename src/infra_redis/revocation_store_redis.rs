use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult, Script};
use std::future::Future;
use std::time::Duration;

const TAKE: &str = include_str!("take.lua");

pub struct RedisRevocationStore {
    conn: ConnectionManager,
    prefix: String,
    op_timeout: Duration,
    take_script: Script,
}

impl RedisRevocationStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, op_timeout: Duration) -> Self {
        RedisRevocationStore {
            conn,
            prefix: prefix.into(),
            op_timeout,
            take_script: Script::new(TAKE),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.prefix, key)
    }

    /// Runs one round trip under the client-side timeout.
    async fn bounded<T>(&self, call: impl Future<Output = RedisResult<T>>) -> Result<T, StoreError> {
        match tokio::time::timeout(self.op_timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(StoreError::Unavailable(e.to_string())),
            Err(_) => Err(StoreError::Timeout(self.op_timeout)),
        }
    }
}

#[async_trait::async_trait]
impl RevocationStore for RedisRevocationStore {
    async fn put_with_ttl(
        &self,
        key: &str,
        value: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        self.bounded(async move { conn.set_ex(&key, value, ttl_secs).await })
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        self.bounded(async move { conn.get(&key).await }).await
    }

    async fn take(&self, key: &str) -> Result<Option<String>, StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        let script = &self.take_script;
        self.bounded(async move { script.key(&key).invoke_async(&mut conn).await })
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        self.bounded(async move { conn.del(&key).await }).await
    }

    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let key = self.key(key);
        let mut conn = self.conn.clone();
        self.bounded(async move { conn.exists(&key).await }).await
    }

    async fn add_to_set(
        &self,
        set_key: &str,
        member: &str,
        ttl_secs: u64,
    ) -> Result<(), StoreError> {
        let key = self.key(set_key);
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.atomic()
            .cmd("RPUSH")
            .arg(&key)
            .arg(member)
            .ignore()
            .cmd("EXPIRE")
            .arg(&key)
            .arg(ttl_secs)
            .ignore();
        self.bounded(async move { pipe.query_async(&mut conn).await })
            .await
    }

    async fn members_of(&self, set_key: &str) -> Result<Vec<String>, StoreError> {
        let key = self.key(set_key);
        let mut conn = self.conn.clone();
        self.bounded(async move { conn.lrange(&key, 0, -1).await })
            .await
    }

    async fn remove_from_set(&self, set_key: &str, member: &str) -> Result<(), StoreError> {
        let key = self.key(set_key);
        let mut conn = self.conn.clone();
        self.bounded(async move { conn.lrem(&key, 0, member).await })
            .await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _pong: String = self
            .bounded(async move { redis::cmd("PING").query_async(&mut conn).await })
            .await?;
        Ok(())
    }
}

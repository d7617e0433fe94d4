use super::token_fingerprint;
use crate::application_port::*;
use crate::domain_model::UserId;
use crate::domain_port::RevocationStore;
use std::sync::Arc;

fn token_key(fingerprint: &str) -> String {
    format!("refresh_token:{fingerprint}")
}

fn user_key(user_id: UserId) -> String {
    format!("user_tokens:{user_id}")
}

/// Refresh-token lifecycle on top of a [`RevocationStore`].
///
/// Each live token has a mapping `refresh_token:<fp> -> user id` and is listed,
/// oldest first, under `user_tokens:<user id>`. The mapping is the source of truth;
/// the list only drives bulk revocation and the device cap.
pub struct StoreRefreshSessionManager {
    store: Arc<dyn RevocationStore>,
    max_sessions: usize,
    refresh_ttl_secs: u64,
}

impl StoreRefreshSessionManager {
    pub fn new(store: Arc<dyn RevocationStore>, max_sessions: usize, refresh_ttl_secs: u64) -> Self {
        StoreRefreshSessionManager {
            store,
            max_sessions: max_sessions.max(1),
            refresh_ttl_secs,
        }
    }

    /// Drops list members whose mapping has expired, then evicts the oldest live
    /// members beyond `max_sessions`.
    async fn enforce_session_cap(&self, user_id: UserId) -> Result<(), AuthError> {
        let list_key = user_key(user_id);
        let mut live = Vec::new();
        for fingerprint in self.store.members_of(&list_key).await? {
            if self.store.exists(&token_key(&fingerprint)).await? {
                live.push(fingerprint);
            } else {
                self.store.remove_from_set(&list_key, &fingerprint).await?;
            }
        }

        let excess = live.len().saturating_sub(self.max_sessions);
        for fingerprint in &live[..excess] {
            self.store.delete(&token_key(fingerprint)).await?;
            self.store.remove_from_set(&list_key, fingerprint).await?;
        }
        if excess > 0 {
            tracing::info!(user_id = %user_id, evicted = excess, "refresh sessions evicted");
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RefreshSessionManager for StoreRefreshSessionManager {
    async fn store_refresh_token(
        &self,
        user_id: UserId,
        new: &RefreshToken,
        old: Option<&RefreshToken>,
    ) -> Result<(), AuthError> {
        let list_key = user_key(user_id);

        if let Some(old) = old {
            let old_fp = token_fingerprint(&old.0);
            let owner = self.store.take(&token_key(&old_fp)).await?;
            if owner.as_deref() != Some(user_id.to_string().as_str()) {
                tracing::warn!(user_id = %user_id, "refresh token reused or no longer live");
                return Err(AuthError::Unauthorized(INVALID_REFRESH_TOKEN));
            }
            self.store.remove_from_set(&list_key, &old_fp).await?;
        }

        let new_fp = token_fingerprint(&new.0);
        self.store
            .put_with_ttl(&token_key(&new_fp), &user_id.to_string(), self.refresh_ttl_secs)
            .await?;
        self.store
            .add_to_set(&list_key, &new_fp, self.refresh_ttl_secs)
            .await?;

        self.enforce_session_cap(user_id).await
    }

    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<Option<UserId>, AuthError> {
        let owner = self
            .store
            .get(&token_key(&token_fingerprint(&token.0)))
            .await?;
        Ok(owner.and_then(|id| id.parse::<UserId>().ok()))
    }

    async fn revoke_refresh_token(&self, token: &RefreshToken) -> Result<(), AuthError> {
        let fingerprint = token_fingerprint(&token.0);
        let owner = self.store.take(&token_key(&fingerprint)).await?;
        if let Some(user_id) = owner.and_then(|id| id.parse::<UserId>().ok()) {
            self.store
                .remove_from_set(&user_key(user_id), &fingerprint)
                .await?;
        }
        Ok(())
    }

    async fn revoke_all_user_tokens(&self, user_id: UserId) -> Result<(), AuthError> {
        let list_key = user_key(user_id);
        let members = self.store.members_of(&list_key).await?;
        for fingerprint in &members {
            self.store.delete(&token_key(fingerprint)).await?;
        }
        self.store.delete(&list_key).await?;
        tracing::info!(user_id = %user_id, revoked = members.len(), "refresh sessions revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::InMemoryRevocationStore;
    use std::time::Duration;

    fn manager(max_sessions: usize) -> StoreRefreshSessionManager {
        StoreRefreshSessionManager::new(Arc::new(InMemoryRevocationStore::new()), max_sessions, 60)
    }

    fn token(s: &str) -> RefreshToken {
        RefreshToken(s.to_string())
    }

    #[tokio::test]
    async fn rotation_is_single_use() {
        let sessions = manager(5);
        let user = UserId::new();
        sessions.store_refresh_token(user, &token("r1"), None).await.unwrap();

        sessions
            .store_refresh_token(user, &token("r2"), Some(&token("r1")))
            .await
            .unwrap();
        assert_eq!(sessions.verify_refresh_token(&token("r1")).await.unwrap(), None);
        assert_eq!(
            sessions.verify_refresh_token(&token("r2")).await.unwrap(),
            Some(user)
        );

        let err = sessions
            .store_refresh_token(user, &token("r3"), Some(&token("r1")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(INVALID_REFRESH_TOKEN)));
        assert_eq!(sessions.verify_refresh_token(&token("r3")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn concurrent_rotation_has_one_winner() {
        let sessions = Arc::new(manager(5));
        let user = UserId::new();
        sessions.store_refresh_token(user, &token("r1"), None).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let sessions = sessions.clone();
                tokio::spawn(async move {
                    let new = token(&format!("next-{i}"));
                    sessions
                        .store_refresh_token(user, &new, Some(&token("r1")))
                        .await
                        .map(|_| new)
                })
            })
            .collect();

        let mut winners = Vec::new();
        for handle in handles {
            if let Ok(new) = handle.await.unwrap() {
                winners.push(new);
            }
        }
        assert_eq!(winners.len(), 1);

        let mut live = 0;
        for i in 0..8 {
            if sessions
                .verify_refresh_token(&token(&format!("next-{i}")))
                .await
                .unwrap()
                .is_some()
            {
                live += 1;
            }
        }
        assert_eq!(live, 1);
    }

    #[tokio::test]
    async fn device_cap_evicts_oldest_only() {
        let sessions = manager(5);
        let user = UserId::new();
        for i in 1..=6 {
            sessions
                .store_refresh_token(user, &token(&format!("r{i}")), None)
                .await
                .unwrap();
        }

        assert_eq!(sessions.verify_refresh_token(&token("r1")).await.unwrap(), None);
        for i in 2..=6 {
            assert_eq!(
                sessions
                    .verify_refresh_token(&token(&format!("r{i}")))
                    .await
                    .unwrap(),
                Some(user)
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn expired_tokens_do_not_count_towards_the_cap() {
        let sessions = manager(2);
        let user = UserId::new();
        sessions.store_refresh_token(user, &token("old"), None).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;
        sessions.store_refresh_token(user, &token("a"), None).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        // "old" has expired by now, so "a" survives the third sign-in
        sessions.store_refresh_token(user, &token("b"), None).await.unwrap();
        assert_eq!(sessions.verify_refresh_token(&token("old")).await.unwrap(), None);
        assert_eq!(sessions.verify_refresh_token(&token("a")).await.unwrap(), Some(user));
        assert_eq!(sessions.verify_refresh_token(&token("b")).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn revoke_all_leaves_other_users_alone() {
        let sessions = manager(5);
        let alice = UserId::new();
        let bob = UserId::new();
        sessions.store_refresh_token(alice, &token("a1"), None).await.unwrap();
        sessions.store_refresh_token(alice, &token("a2"), None).await.unwrap();
        sessions.store_refresh_token(bob, &token("b1"), None).await.unwrap();

        sessions.revoke_all_user_tokens(alice).await.unwrap();
        assert_eq!(sessions.verify_refresh_token(&token("a1")).await.unwrap(), None);
        assert_eq!(sessions.verify_refresh_token(&token("a2")).await.unwrap(), None);
        assert_eq!(sessions.verify_refresh_token(&token("b1")).await.unwrap(), Some(bob));

        // idempotent
        sessions.revoke_all_user_tokens(alice).await.unwrap();
    }

    #[tokio::test]
    async fn revoke_single_token() {
        let sessions = manager(5);
        let user = UserId::new();
        sessions.store_refresh_token(user, &token("r1"), None).await.unwrap();
        sessions.store_refresh_token(user, &token("r2"), None).await.unwrap();

        sessions.revoke_refresh_token(&token("r1")).await.unwrap();
        assert_eq!(sessions.verify_refresh_token(&token("r1")).await.unwrap(), None);
        assert_eq!(sessions.verify_refresh_token(&token("r2")).await.unwrap(), Some(user));
        let err = sessions
            .store_refresh_token(user, &token("r3"), Some(&token("r1")))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }
}

use super::token_fingerprint;
use crate::application_port::*;
use crate::domain_port::RevocationStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;

const REVOKED: &str = "revoked";

fn denylist_key(fingerprint: &str) -> String {
    format!("blacklist:token:{fingerprint}")
}

/// Seconds a denylist entry must live so it outlasts the token. `exp` has whole
/// second precision and the token is accepted while `now <= exp`, so the entry has
/// to cover the full second after `exp`.
fn denylist_ttl(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> Option<u64> {
    let ttl = expires_at.timestamp() - now.timestamp() + 1;
    u64::try_from(ttl).ok().filter(|ttl| *ttl > 0)
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(authorization: Option<&str>) -> Result<AccessToken, AuthError> {
    let header = match authorization.map(str::trim) {
        None | Some("") => return Err(AuthError::Unauthorized(MISSING_BEARER)),
        Some(header) => header,
    };
    match header.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Ok(AccessToken(token.to_string())),
        _ => Err(AuthError::Unauthorized(MALFORMED_BEARER)),
    }
}

/// Checks bearer tokens against the denylist before trusting their claims.
///
/// A denylist lookup that fails surfaces as [`AuthError::Store`]; the request is
/// refused rather than let through.
pub struct DenylistAccessGuard {
    token_codec: Arc<dyn TokenCodec>,
    store: Arc<dyn RevocationStore>,
}

impl DenylistAccessGuard {
    pub fn new(token_codec: Arc<dyn TokenCodec>, store: Arc<dyn RevocationStore>) -> Self {
        DenylistAccessGuard { token_codec, store }
    }
}

#[async_trait::async_trait]
impl AccessGuard for DenylistAccessGuard {
    async fn authorize(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError> {
        let token = bearer_token(authorization)?;

        if self
            .store
            .exists(&denylist_key(&token_fingerprint(&token.0)))
            .await?
        {
            return Err(AuthError::TokenRevoked);
        }

        let claims = self.token_codec.verify_access_token(&token).await?;
        Ok(AuthContext {
            user_id: claims.subject.user_id,
            email: claims.subject.email,
            token,
            expires_at: claims.expires_at,
        })
    }

    async fn revoke(&self, token: &AccessToken) -> Result<(), AuthError> {
        let claims = match self.token_codec.verify_access_token(token).await {
            Ok(claims) => claims,
            // expired or foreign tokens are already unusable
            Err(AuthError::InvalidToken) => return Ok(()),
            Err(e) => return Err(e),
        };

        let Some(ttl) = denylist_ttl(claims.expires_at, Utc::now()) else {
            return Ok(());
        };
        self.store
            .put_with_ttl(&denylist_key(&token_fingerprint(&token.0)), REVOKED, ttl)
            .await?;
        Ok(())
    }
}

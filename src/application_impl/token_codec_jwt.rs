use crate::application_port::*;
use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub access_secret: Vec<u8>,
    pub refresh_secret: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    email: String,
    iat: i64,
    exp: i64,
    iss: String,
    aud: String,
    jti: String,
}

/// Which secret and lifetime a token is signed with.
#[derive(Debug, Clone, Copy)]
enum TokenClass {
    Access,
    Refresh,
}

pub struct JwtHs512Codec {
    cfg: JwtConfig,
    access_keys: (EncodingKey, DecodingKey),
    refresh_keys: (EncodingKey, DecodingKey),
    validation: Validation,
}

impl JwtHs512Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = 0;
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_audience(&[cfg.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        JwtHs512Codec {
            access_keys: (
                EncodingKey::from_secret(&cfg.access_secret),
                DecodingKey::from_secret(&cfg.access_secret),
            ),
            refresh_keys: (
                EncodingKey::from_secret(&cfg.refresh_secret),
                DecodingKey::from_secret(&cfg.refresh_secret),
            ),
            validation,
            cfg,
        }
    }

    fn keys(&self, class: TokenClass) -> &(EncodingKey, DecodingKey) {
        match class {
            TokenClass::Access => &self.access_keys,
            TokenClass::Refresh => &self.refresh_keys,
        }
    }

    fn ttl(&self, class: TokenClass) -> Duration {
        match class {
            TokenClass::Access => self.cfg.access_ttl,
            TokenClass::Refresh => self.cfg.refresh_ttl,
        }
    }

    fn issue(&self, class: TokenClass, subject: &Subject) -> Result<IssuedToken, AuthError> {
        let issued_at = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl(class))
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        let expires_at = issued_at + ttl;
        let claims = Claims {
            sub: subject.user_id.to_string(),
            email: subject.email.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            jti: uuid::Uuid::new_v4().to_string(),
        };
        let token = self.encode_claims(class, &claims)?;
        Ok(IssuedToken { token, expires_at })
    }

    fn encode_claims(&self, class: TokenClass, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS512), claims, &self.keys(class).0)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }

    fn verify(&self, class: TokenClass, token: &str) -> Result<TokenClaims, AuthError> {
        let data = decode::<Claims>(token, &self.keys(class).1, &self.validation)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims = data.claims;

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| AuthError::InvalidToken)?;
        let issued_at =
            DateTime::<Utc>::from_timestamp(claims.iat, 0).ok_or(AuthError::InvalidToken)?;
        let expires_at =
            DateTime::<Utc>::from_timestamp(claims.exp, 0).ok_or(AuthError::InvalidToken)?;

        Ok(TokenClaims {
            subject: Subject {
                user_id,
                email: claims.email,
            },
            issued_at,
            expires_at,
        })
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs512Codec {
    async fn issue_access_token(&self, subject: &Subject) -> Result<IssuedToken, AuthError> {
        self.issue(TokenClass::Access, subject)
    }

    async fn issue_refresh_token(&self, subject: &Subject) -> Result<IssuedToken, AuthError> {
        self.issue(TokenClass::Refresh, subject)
    }

    async fn verify_access_token(&self, token: &AccessToken) -> Result<TokenClaims, AuthError> {
        self.verify(TokenClass::Access, &token.0)
    }

    async fn verify_refresh_token(
        &self,
        token: &RefreshToken,
    ) -> Result<TokenClaims, AuthError> {
        self.verify(TokenClass::Refresh, &token.0)
    }
}

use crate::domain_model::{UserId, UserView};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Messages shared by every path that rejects credentials or refresh tokens, so
/// callers cannot tell the underlying reasons apart.
pub const INVALID_CREDENTIALS: &str = "Invalid email or password";
pub const INVALID_REFRESH_TOKEN: &str = "Invalid or expired refresh token";
pub const MISSING_BEARER: &str = "Authorization token is required";
pub const MALFORMED_BEARER: &str = "Invalid authorization format";

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("User with this email already exists")]
    EmailTaken,
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("Token has been revoked")]
    TokenRevoked,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone)]
pub struct SignupInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthTokens {
    #[serde(rename = "token")]
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub user: UserView,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}

/// Who a token speaks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub user_id: UserId,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub subject: Subject,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// What the access guard attaches to an authorized request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: UserId,
    pub email: String,
    pub token: AccessToken,
    pub expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(&self, subject: &Subject) -> Result<IssuedToken, AuthError>;
    async fn issue_refresh_token(&self, subject: &Subject) -> Result<IssuedToken, AuthError>;
    async fn verify_access_token(&self, token: &AccessToken) -> Result<TokenClaims, AuthError>;
    async fn verify_refresh_token(&self, token: &RefreshToken)
    -> Result<TokenClaims, AuthError>;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    /// `false` for a wrong password and for a hash that cannot be parsed.
    async fn verify_password(&self, password: &str, password_hash: &str) -> bool;
}

#[async_trait::async_trait]
pub trait RefreshSessionManager: Send + Sync {
    /// Records `new` as a live refresh token of `user_id`. When `old` is given the
    /// old token is consumed first; if it is no longer live the call fails and
    /// `new` is not recorded.
    async fn store_refresh_token(
        &self,
        user_id: UserId,
        new: &RefreshToken,
        old: Option<&RefreshToken>,
    ) -> Result<(), AuthError>;
    async fn verify_refresh_token(&self, token: &RefreshToken)
    -> Result<Option<UserId>, AuthError>;
    async fn revoke_refresh_token(&self, token: &RefreshToken) -> Result<(), AuthError>;
    async fn revoke_all_user_tokens(&self, user_id: UserId) -> Result<(), AuthError>;
}

#[async_trait::async_trait]
pub trait AccessGuard: Send + Sync {
    /// Authorizes a request from its raw `Authorization` header value.
    async fn authorize(&self, authorization: Option<&str>) -> Result<AuthContext, AuthError>;
    /// Denylists `token` for the rest of its natural lifetime.
    async fn revoke(&self, token: &AccessToken) -> Result<(), AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn signup(&self, request: SignupInput) -> Result<LoginResult, AuthError>;
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;
    async fn sign_out(&self, user_id: UserId, access_token: &AccessToken)
    -> Result<(), AuthError>;
}

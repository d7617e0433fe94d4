use crate::application_port::*;
use crate::domain_model::{User, UserId, UserView};
use crate::domain_port::UserRepo;
use std::sync::Arc;
use tokio::sync::OnceCell;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_EMAIL_LEN: usize = 254;
const DECOY_PASSWORD: &str = "strongbox-decoy-password";

fn is_valid_email(email: &str) -> bool {
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split('.')
            .all(|label| !label.is_empty() && !label.starts_with('-') && !label.ends_with('-'))
        && domain.contains('.')
}

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    sessions: Arc<dyn RefreshSessionManager>,
    access_guard: Arc<dyn AccessGuard>,
    /// Hash checked against when the email is unknown, so both sign-in failures
    /// pay for one verification.
    decoy_hash: OnceCell<String>,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        sessions: Arc<dyn RefreshSessionManager>,
        access_guard: Arc<dyn AccessGuard>,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            token_codec,
            sessions,
            access_guard,
            decoy_hash: OnceCell::new(),
        }
    }

    async fn verify_decoy(&self, password: &str) -> Result<(), AuthError> {
        let hash = self
            .decoy_hash
            .get_or_try_init(|| self.credential_hasher.hash_password(DECOY_PASSWORD))
            .await?;
        self.credential_hasher.verify_password(password, hash).await;
        Ok(())
    }

    fn validate_signup(email: &str, password: &str) -> Result<(), AuthError> {
        if !is_valid_email(email) {
            return Err(AuthError::Validation(
                "Please provide a valid email".to_string(),
            ));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }
        Ok(())
    }

    async fn issue_pair(&self, user: &User) -> Result<AuthTokens, AuthError> {
        let subject = Subject {
            user_id: user.id,
            email: user.email.clone(),
        };
        let access = self.token_codec.issue_access_token(&subject).await?;
        let refresh = self.token_codec.issue_refresh_token(&subject).await?;
        Ok(AuthTokens {
            access_token: AccessToken(access.token),
            refresh_token: RefreshToken(refresh.token),
        })
    }

    /// Issues a fresh pair and records its refresh token as a new session.
    async fn open_session(&self, user: &User) -> Result<LoginResult, AuthError> {
        let tokens = self.issue_pair(user).await?;
        self.sessions
            .store_refresh_token(user.id, &tokens.refresh_token, None)
            .await?;
        Ok(LoginResult {
            user: UserView::from(user),
            tokens,
        })
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn signup(&self, request: SignupInput) -> Result<LoginResult, AuthError> {
        let SignupInput { email, password } = request;
        Self::validate_signup(&email, &password)?;

        if self.user_repo.email_exists(&email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.credential_hasher.hash_password(&password).await?;
        let user = self.user_repo.create(&email, &password_hash).await?;

        match self.open_session(&user).await {
            Ok(result) => {
                tracing::info!(user_id = %user.id, "user signed up");
                Ok(result)
            }
            Err(e) => {
                // leave no account behind that the caller was never told about
                if let Err(undo) = self.user_repo.delete(user.id).await {
                    tracing::error!(user_id = %user.id, error = %undo, "failed to undo sign-up");
                }
                Err(e)
            }
        }
    }

    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "Email and password are required".to_string(),
            ));
        }

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            self.verify_decoy(&password).await?;
            return Err(AuthError::Unauthorized(INVALID_CREDENTIALS));
        };

        if !self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await
        {
            return Err(AuthError::Unauthorized(INVALID_CREDENTIALS));
        }

        tracing::info!(user_id = %user.id, "user signed in");
        self.open_session(&user).await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::Validation(
                "Refresh token is required".to_string(),
            ));
        }
        let presented = RefreshToken(refresh_token.to_string());
        let invalid = || AuthError::Unauthorized(INVALID_REFRESH_TOKEN);

        let claims = match self.token_codec.verify_refresh_token(&presented).await {
            Ok(claims) => claims,
            Err(AuthError::InvalidToken) => return Err(invalid()),
            Err(e) => return Err(e),
        };

        let owner: UserId = self
            .sessions
            .verify_refresh_token(&presented)
            .await?
            .ok_or_else(invalid)?;
        if owner != claims.subject.user_id {
            tracing::warn!(user_id = %owner, "refresh token subject mismatch");
            return Err(invalid());
        }

        let user = self
            .user_repo
            .find_by_id(owner)
            .await?
            .ok_or_else(invalid)?;

        let tokens = self.issue_pair(&user).await?;
        self.sessions
            .store_refresh_token(user.id, &tokens.refresh_token, Some(&presented))
            .await?;
        tracing::debug!(user_id = %user.id, "refresh token rotated");
        Ok(tokens)
    }

    async fn sign_out(&self, user_id: UserId, access_token: &AccessToken) -> Result<(), AuthError> {
        // the access token expires on its own within minutes
        if let Err(e) = self.access_guard.revoke(access_token).await {
            tracing::error!(user_id = %user_id, error = %e, "failed to denylist access token");
        }
        self.sessions.revoke_all_user_tokens(user_id).await?;
        tracing::info!(user_id = %user_id, "user signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::testing::{FailingStore, test_auth_service, test_jwt_config};
    use crate::application_impl::{
        Argon2PasswordHasher, DenylistAccessGuard, JwtHs512Codec, StoreRefreshSessionManager,
    };
    use crate::domain_port::RevocationStore;
    use crate::infra_memory::{InMemoryRevocationStore, InMemoryUserRepo};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Cheap Argon2 hasher that counts verifications.
    struct CountingHasher {
        inner: Argon2PasswordHasher,
        verifications: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CredentialHasher for CountingHasher {
        async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
            self.inner.hash_password(password).await
        }

        async fn verify_password(&self, password: &str, password_hash: &str) -> bool {
            self.verifications.fetch_add(1, Ordering::SeqCst);
            self.inner.verify_password(password, password_hash).await
        }
    }

    fn service_with(
        user_repo: Arc<dyn UserRepo>,
        hasher: Arc<dyn CredentialHasher>,
        store: Arc<dyn RevocationStore>,
    ) -> RealAuthService {
        let cfg = test_jwt_config();
        let refresh_ttl_secs = cfg.refresh_ttl.as_secs();
        let codec = Arc::new(JwtHs512Codec::new(cfg));
        let guard = Arc::new(DenylistAccessGuard::new(codec.clone(), store.clone()));
        let sessions = Arc::new(StoreRefreshSessionManager::new(store, 5, refresh_ttl_secs));
        RealAuthService::new(user_repo, hasher, codec, sessions, guard)
    }

    fn signup_input(email: &str, password: &str) -> SignupInput {
        SignupInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn login_input(email: &str, password: &str) -> LoginInput {
        LoginInput {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn bearer(token: &AccessToken) -> String {
        format!("Bearer {}", token.0)
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@example.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email("example.com"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a@@example.com"));
        assert!(!is_valid_email("a b@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("a@example..com"));
    }

    #[tokio::test]
    async fn signup_validates_input() {
        let (auth, _) = test_auth_service(Arc::new(InMemoryRevocationStore::new()));
        let err = auth
            .signup(signup_input("not-an-email", "password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
        let err = auth
            .signup(signup_input("a@example.com", "short"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Validation(_)));
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let (auth, _) = test_auth_service(Arc::new(InMemoryRevocationStore::new()));
        auth.signup(signup_input("a@example.com", "password123"))
            .await
            .unwrap();
        let err = auth
            .signup(signup_input("a@example.com", "password456"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
        // emails compare exactly
        auth.signup(signup_input("A@example.com", "password456"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn signin_returns_a_new_pair() {
        let (auth, _) = test_auth_service(Arc::new(InMemoryRevocationStore::new()));
        let signed_up = auth
            .signup(signup_input("a@example.com", "password123"))
            .await
            .unwrap();
        let signed_in = auth
            .login(login_input("a@example.com", "password123"))
            .await
            .unwrap();

        assert_eq!(signed_in.user, signed_up.user);
        assert_ne!(signed_in.tokens.access_token, signed_up.tokens.access_token);
        assert_ne!(signed_in.tokens.refresh_token, signed_up.tokens.refresh_token);
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_look_the_same() {
        let (auth, _) = test_auth_service(Arc::new(InMemoryRevocationStore::new()));
        auth.signup(signup_input("a@example.com", "password123"))
            .await
            .unwrap();

        let unknown = auth
            .login(login_input("b@example.com", "password123"))
            .await
            .unwrap_err();
        let wrong = auth
            .login(login_input("a@example.com", "password999"))
            .await
            .unwrap_err();
        assert!(matches!(unknown, AuthError::Unauthorized(INVALID_CREDENTIALS)));
        assert!(matches!(wrong, AuthError::Unauthorized(INVALID_CREDENTIALS)));
        assert_eq!(unknown.to_string(), wrong.to_string());
    }

    #[tokio::test]
    async fn rotation_chain() {
        let (auth, _) = test_auth_service(Arc::new(InMemoryRevocationStore::new()));
        let t0 = auth
            .signup(signup_input("a@example.com", "password123"))
            .await
            .unwrap()
            .tokens;

        let t1 = auth.refresh_token(&t0.refresh_token.0).await.unwrap();
        let t2 = auth.refresh_token(&t1.refresh_token.0).await.unwrap();
        assert_ne!(t1.refresh_token, t2.refresh_token);

        for stale in [&t0.refresh_token, &t1.refresh_token] {
            let err = auth.refresh_token(&stale.0).await.unwrap_err();
            assert!(matches!(err, AuthError::Unauthorized(INVALID_REFRESH_TOKEN)));
        }
        auth.refresh_token(&t2.refresh_token.0).await.unwrap();
    }

    #[tokio::test]
    async fn access_token_is_not_a_refresh_token() {
        let (auth, _) = test_auth_service(Arc::new(InMemoryRevocationStore::new()));
        let tokens = auth
            .signup(signup_input("a@example.com", "password123"))
            .await
            .unwrap()
            .tokens;
        let err = auth.refresh_token(&tokens.access_token.0).await.unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(INVALID_REFRESH_TOKEN)));
    }

    #[tokio::test]
    async fn sign_out_revokes_everything_of_that_user_only() {
        let (auth, guard) = test_auth_service(Arc::new(InMemoryRevocationStore::new()));
        let alice_1 = auth
            .signup(signup_input("alice@example.com", "password123"))
            .await
            .unwrap();
        let alice_2 = auth
            .login(login_input("alice@example.com", "password123"))
            .await
            .unwrap();
        let bob = auth
            .signup(signup_input("bob@example.com", "password123"))
            .await
            .unwrap();

        let ctx = guard
            .authorize(Some(&bearer(&alice_1.tokens.access_token)))
            .await
            .unwrap();
        auth.sign_out(ctx.user_id, &ctx.token).await.unwrap();

        let err = guard
            .authorize(Some(&bearer(&alice_1.tokens.access_token)))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::TokenRevoked));
        for refresh in [&alice_1.tokens.refresh_token, &alice_2.tokens.refresh_token] {
            assert!(auth.refresh_token(&refresh.0).await.is_err());
        }

        guard
            .authorize(Some(&bearer(&bob.tokens.access_token)))
            .await
            .unwrap();
        auth.refresh_token(&bob.tokens.refresh_token.0).await.unwrap();

        // signing out twice is harmless
        auth.sign_out(ctx.user_id, &ctx.token).await.unwrap();
    }

    #[tokio::test]
    async fn sixth_signin_evicts_the_first_session() {
        let (auth, _) = test_auth_service(Arc::new(InMemoryRevocationStore::new()));
        auth.signup(signup_input("a@example.com", "password123"))
            .await
            .unwrap();

        let mut sessions = Vec::new();
        for _ in 0..6 {
            let result = auth
                .login(login_input("a@example.com", "password123"))
                .await
                .unwrap();
            sessions.push(result.tokens.refresh_token);
        }

        // signup opened a session too, so the first two are gone
        assert!(auth.refresh_token(&sessions[0].0).await.is_err());
        for refresh in &sessions[1..] {
            auth.refresh_token(&refresh.0).await.unwrap();
        }
    }

    #[tokio::test]
    async fn store_outage_is_not_an_auth_failure() {
        let (auth, _) = test_auth_service(Arc::new(FailingStore));
        let err = auth
            .signup(signup_input("a@example.com", "password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }

    #[tokio::test]
    async fn unknown_email_still_verifies_a_password() {
        let hasher = Arc::new(CountingHasher {
            inner: Argon2PasswordHasher::new(1024, 1, 1).unwrap(),
            verifications: AtomicUsize::new(0),
        });
        let auth = service_with(
            Arc::new(InMemoryUserRepo::new()),
            hasher.clone(),
            Arc::new(InMemoryRevocationStore::new()),
        );

        for _ in 0..2 {
            let err = auth
                .login(login_input("nobody@example.com", "password123"))
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::Unauthorized(INVALID_CREDENTIALS)));
        }
        assert_eq!(hasher.verifications.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_signup_leaves_no_account_behind() {
        let users = Arc::new(InMemoryUserRepo::new());
        let hasher = Arc::new(Argon2PasswordHasher::new(1024, 1, 1).unwrap());
        let broken = service_with(users.clone(), hasher.clone(), Arc::new(FailingStore));
        let err = broken
            .signup(signup_input("a@example.com", "password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
        assert!(!users.email_exists("a@example.com").await.unwrap());

        // once the store is back the same sign-up goes through
        let healthy = service_with(users, hasher, Arc::new(InMemoryRevocationStore::new()));
        healthy
            .signup(signup_input("a@example.com", "password123"))
            .await
            .unwrap();
    }
}

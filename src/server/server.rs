use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::logger::*;
use crate::settings::{Settings, StoreBackend, UserBackend};
use anyhow::anyhow;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Composition root: every service, wired from [`Settings`].
pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub wallet_service: Arc<dyn WalletService>,
    pub access_guard: Arc<dyn AccessGuard>,
    pub revocation_store: Arc<dyn RevocationStore>,
    pub user_repo: Arc<dyn UserRepo>,
    /// Render internal error details in responses (development only).
    pub expose_error_detail: bool,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        settings.validate()?;

        let revocation_store: Arc<dyn RevocationStore> = match settings.store.backend {
            StoreBackend::Memory => {
                warn!("revocation store is in-memory; sessions are lost on restart");
                Arc::new(InMemoryRevocationStore::new())
            }
            StoreBackend::Redis => {
                let redis_settings = settings
                    .redis
                    .as_ref()
                    .ok_or_else(|| anyhow!("missing [redis] settings"))?;
                let redis_client = redis::Client::open(redis_settings.connection_info())?;
                let redis_manager = redis_client.get_connection_manager().await?;
                info!(host = %redis_settings.host, port = redis_settings.port, "connected to redis");
                Arc::new(RedisRevocationStore::new(
                    redis_manager,
                    redis_settings.prefix.clone(),
                    Duration::from_millis(redis_settings.op_timeout_ms),
                ))
            }
        };

        let (user_repo, wallet_repo, pool) = match settings.user.backend {
            UserBackend::Memory => {
                warn!("user and wallet records are in-memory");
                let user_repo: Arc<dyn UserRepo> = Arc::new(InMemoryUserRepo::new());
                let wallet_repo: Arc<dyn WalletRepo> = Arc::new(InMemoryWalletRepo::new());
                (user_repo, wallet_repo, None)
            }
            UserBackend::Mysql => {
                let mysql_settings = settings
                    .mysql
                    .as_ref()
                    .ok_or_else(|| anyhow!("missing [mysql] settings"))?;
                let pool = MySqlPoolOptions::new()
                    .max_connections(mysql_settings.max_connections)
                    .connect(&mysql_settings.url)
                    .await?;
                info!("connected to mysql");
                let user_repo: Arc<dyn UserRepo> = Arc::new(MySqlUserRepo::new(pool.clone()));
                let wallet_repo: Arc<dyn WalletRepo> =
                    Arc::new(MySqlWalletRepo::new(pool.clone()));
                (user_repo, wallet_repo, Some(pool))
            }
        };

        let hasher_settings = &settings.hasher;
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher::new(
            hasher_settings.memory_kib,
            hasher_settings.iterations,
            hasher_settings.parallelism,
        )?);

        let jwt = &settings.jwt;
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs512Codec::new(JwtConfig {
            issuer: jwt.issuer.clone(),
            audience: jwt.audience.clone(),
            access_ttl: Duration::from_secs(jwt.access_ttl_secs),
            refresh_ttl: Duration::from_secs(jwt.refresh_ttl_secs),
            access_secret: jwt.access_secret.clone().into_bytes(),
            refresh_secret: jwt.refresh_secret.clone().into_bytes(),
        }));

        let sessions: Arc<dyn RefreshSessionManager> = Arc::new(StoreRefreshSessionManager::new(
            revocation_store.clone(),
            settings.session.max_sessions,
            jwt.refresh_ttl_secs,
        ));
        let access_guard: Arc<dyn AccessGuard> = Arc::new(DenylistAccessGuard::new(
            token_codec.clone(),
            revocation_store.clone(),
        ));

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo.clone(),
            credential_hasher,
            token_codec,
            sessions,
            access_guard.clone(),
        ));
        let wallet_service: Arc<dyn WalletService> = Arc::new(RealWalletService::new(wallet_repo));

        info!(environment = %settings.app.environment, "server started");

        Ok(Self {
            auth_service,
            wallet_service,
            access_guard,
            revocation_store,
            user_repo,
            expose_error_detail: settings.app.is_development(),
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("mysql pool closed");
        }
    }
}

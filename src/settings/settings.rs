use anyhow::{Result, anyhow, bail};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

/// Minimum length of each signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub app: App,
    pub http: Http,
    pub log: Log,
    pub jwt: Jwt,
    #[serde(default)]
    pub hasher: Hasher,
    #[serde(default)]
    pub session: Session,
    pub store: Store,
    pub redis: Option<Redis>,
    pub user: User,
    pub mysql: Option<Mysql>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct App {
    pub environment: String, // "development" exposes error details
}

impl App {
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Http {
    pub address: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Clone, Deserialize)]
pub struct Jwt {
    pub access_secret: String,
    pub refresh_secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
    pub issuer: String,
    pub audience: String,
}

// secrets stay out of logs
impl std::fmt::Debug for Jwt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwt")
            .field("access_secret", &"<redacted>")
            .field("refresh_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

fn default_access_ttl_secs() -> u64 {
    900
}

fn default_refresh_ttl_secs() -> u64 {
    604_800
}

#[derive(Debug, Clone, Deserialize)]
pub struct Hasher {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for Hasher {
    fn default() -> Self {
        Hasher {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    pub max_sessions: usize,
}

impl Default for Session {
    fn default() -> Self {
        Session { max_sessions: 5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    pub backend: StoreBackend,
}

#[derive(Clone, Deserialize)]
pub struct Redis {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    #[serde(default)]
    pub db: i64,
    pub prefix: String,
    #[serde(default = "default_op_timeout_ms")]
    pub op_timeout_ms: u64,
}

impl Redis {
    /// Built field by field so the password needs no URL escaping.
    pub fn connection_info(&self) -> redis::ConnectionInfo {
        redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(self.host.clone(), self.port),
            redis: redis::RedisConnectionInfo {
                db: self.db,
                password: self.password.clone(),
                ..Default::default()
            },
        }
    }
}

impl std::fmt::Debug for Redis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Redis")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("db", &self.db)
            .field("prefix", &self.prefix)
            .field("op_timeout_ms", &self.op_timeout_ms)
            .finish()
    }
}

fn default_op_timeout_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserBackend {
    Mysql,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub backend: UserBackend,
}

#[derive(Clone, Deserialize)]
pub struct Mysql {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl std::fmt::Debug for Mysql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mysql")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

fn default_max_connections() -> u32 {
    10
}

impl Settings {
    /// Rejects settings the server must not start with.
    pub fn validate(&self) -> Result<()> {
        let jwt = &self.jwt;
        if jwt.access_secret.len() < MIN_SECRET_LEN {
            bail!("jwt.access_secret must be at least {MIN_SECRET_LEN} bytes");
        }
        if jwt.refresh_secret.len() < MIN_SECRET_LEN {
            bail!("jwt.refresh_secret must be at least {MIN_SECRET_LEN} bytes");
        }
        if jwt.access_secret == jwt.refresh_secret {
            bail!("jwt.access_secret and jwt.refresh_secret must differ");
        }
        if jwt.access_ttl_secs == 0 || jwt.refresh_ttl_secs == 0 {
            bail!("jwt token lifetimes must be positive");
        }
        if self.session.max_sessions == 0 {
            bail!("session.max_sessions must be at least 1");
        }
        if self.store.backend == StoreBackend::Redis && self.redis.is_none() {
            bail!("store.backend = \"redis\" needs a [redis] section");
        }
        if self.user.backend == UserBackend::Mysql && self.mysql.is_none() {
            bail!("user.backend = \"mysql\" needs a [mysql] section");
        }
        if self.http.cert_path.is_some() != self.http.key_path.is_some() {
            bail!("http.cert_path and http.key_path must be set together");
        }
        Ok(())
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "STRONGBOX";

/// Loads the settings file (or the build's default), then applies
/// `STRONGBOX_<SECTION>__<KEY>` environment overrides and validates the result.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}

/// Same as [`parse_settings`] for an in-memory TOML document, without
/// environment overrides.
pub fn parse_settings_str(toml: &str) -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[app]
environment = "test"

[http]
address = "127.0.0.1:0"

[log]
filter = "info"

[jwt]
access_secret = "0123456789abcdef0123456789abcdef-access"
refresh_secret = "0123456789abcdef0123456789abcdef-refresh"
issuer = "strongbox"
audience = "strongbox-clients"

[store]
backend = "memory"

[user]
backend = "memory"
"#;

    #[test]
    fn defaults_fill_optional_sections() {
        let settings = parse_settings_str(MINIMAL).unwrap();
        assert_eq!(settings.jwt.access_ttl_secs, 900);
        assert_eq!(settings.jwt.refresh_ttl_secs, 604_800);
        assert_eq!(settings.session.max_sessions, 5);
        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert!(settings.redis.is_none());
        assert!(!settings.app.is_development());
    }

    #[test]
    fn short_or_shared_secrets_are_rejected() {
        let short = MINIMAL.replace("0123456789abcdef0123456789abcdef-access", "short");
        assert!(parse_settings_str(&short).is_err());

        let shared = MINIMAL.replace("-refresh", "-access");
        assert!(parse_settings_str(&shared).is_err());
    }

    #[test]
    fn redis_backend_needs_its_section() {
        let toml = MINIMAL.replace(
            "[store]\nbackend = \"memory\"",
            "[store]\nbackend = \"redis\"",
        );
        assert!(parse_settings_str(&toml).is_err());

        let toml = format!(
            "{toml}\n[redis]\nhost = \"localhost\"\nport = 6379\npassword = \"p@ss:/word\"\ndb = 2\nprefix = \"sb\"\n"
        );
        let settings = parse_settings_str(&toml).unwrap();
        let redis = settings.redis.unwrap();
        assert_eq!(redis.op_timeout_ms, 2000);
        let info = redis.connection_info();
        assert_eq!(
            info.addr,
            redis::ConnectionAddr::Tcp("localhost".to_string(), 6379)
        );
        assert_eq!(info.redis.db, 2);
        assert_eq!(info.redis.password.as_deref(), Some("p@ss:/word"));
        assert!(!format!("{redis:?}").contains("p@ss"));
    }

    #[test]
    fn zero_session_cap_is_rejected() {
        let toml = format!("{MINIMAL}\n[session]\nmax_sessions = 0\n");
        assert!(parse_settings_str(&toml).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("")).is_err());
    }
}

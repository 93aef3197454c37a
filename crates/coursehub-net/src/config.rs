use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::NetError;
use crate::key::KeyScheme;

pub const CONFIG_FILE_ENV: &str = "COURSEHUB_CONFIG_FILE";
const DEFAULT_CONFIG_FILE: &str = "config/coursehub.local.toml";
const ENV_PREFIX: &str = "COURSEHUB";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Sent as the `app` header on every call.
    #[serde(default)]
    pub database: String,
    /// Trusted remote base, used once a token exists for a request shape.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "ApiConfig::default_local_port")]
    pub local_port: u16,
    #[serde(default)]
    pub tokens_path: Option<PathBuf>,
    #[serde(default = "ApiConfig::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub key_scheme: KeyScheme,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            database: String::new(),
            base_url: String::new(),
            local_port: Self::default_local_port(),
            tokens_path: None,
            timeout_ms: Self::default_timeout_ms(),
            key_scheme: KeyScheme::default(),
        }
    }
}

impl ApiConfig {
    fn default_local_port() -> u16 {
        3000
    }

    fn default_timeout_ms() -> u64 {
        30_000
    }

    pub fn new(database: impl Into<String>, base_url: impl Into<String>, local_port: u16) -> Self {
        Self {
            database: database.into(),
            base_url: base_url.into(),
            local_port,
            ..Self::default()
        }
    }

    /// Defaults, then the optional config file, then `COURSEHUB__*` variables.
    /// The file is `$COURSEHUB_CONFIG_FILE`, or `config/coursehub.local.toml`.
    pub fn load() -> Result<Self, NetError> {
        let cfg = Self::read()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Like [`ApiConfig::load`] without validation, for tools that only need
    /// some of the fields.
    pub fn read() -> Result<Self, NetError> {
        Self::read_from(&Self::config_file())
    }

    pub fn load_from(path: &Path) -> Result<Self, NetError> {
        let cfg = Self::read_from(path)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn read_from(path: &Path) -> Result<Self, NetError> {
        let mut builder = config::Config::builder()
            .set_default("local_port", Self::default_local_port() as i64)?
            .set_default("timeout_ms", Self::default_timeout_ms() as i64)?;

        if path.exists() {
            builder = builder.add_source(config::File::from(path));
        }

        builder = builder.add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"));

        let cfg: ApiConfig = builder.build()?.try_deserialize()?;
        tracing::debug!(
            target: "coursehub::config",
            file = %path.display(),
            database = %cfg.database,
            local_port = cfg.local_port,
            "config loaded"
        );
        Ok(cfg)
    }

    fn config_file() -> PathBuf {
        env::var(CONFIG_FILE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    pub fn with_tokens_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tokens_path = Some(path.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_key_scheme(mut self, scheme: KeyScheme) -> Self {
        self.key_scheme = scheme;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), NetError> {
        if self.database.is_empty() {
            return Err(NetError::config("database must be set"));
        }
        self.remote_base()?;
        self.local_base()?;
        Ok(())
    }

    pub fn local_base(&self) -> Result<Url, NetError> {
        Url::parse(&format!("http://localhost:{}", self.local_port))
            .map_err(|err| NetError::config(&format!("local base url parse failed: {err}")))
    }

    pub fn remote_base(&self) -> Result<Url, NetError> {
        Url::parse(&self.base_url)
            .map_err(|err| NetError::config(&format!("remote base url parse failed: {err}")))
    }
}

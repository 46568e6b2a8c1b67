//! Collector configuration.
//!
//! Sources in priority order:
//! 1. Command-line flags (applied by the binary)
//! 2. Environment variables (`KIOSKWATCH_*`)
//! 3. TOML file (`kioskwatch.toml` or `--config <path>`)
//! 4. Built-in defaults
//!
//! Configuration is resolved and validated once at startup.

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::store::BackendKind;

/// Default configuration values.
pub mod defaults {
    pub const STORE_NAME: &str = "kiosk-status";
    pub const SITE_ID: &str = "winnetworkhealthmonitor";
    pub const DATA_PATH: &str = "data/kiosk_status.redb";
    pub const REMOTE_TIMEOUT_SECS: u64 = 10;
    pub const HOST: &str = "127.0.0.1";
    pub const PORT: u16 = 8888;
    /// Maximum accepted report body (1 MiB).
    pub const MAX_BODY_BYTES: usize = 1024 * 1024;
    pub const CONFIG_FILE: &str = "kioskwatch.toml";
}

/// Environment variable names.
pub mod env_vars {
    pub const BACKEND: &str = "KIOSKWATCH_BACKEND";
    pub const STORE_NAME: &str = "KIOSKWATCH_STORE_NAME";
    pub const STORE_TOKEN: &str = "KIOSKWATCH_STORE_TOKEN";
    pub const SITE_ID: &str = "KIOSKWATCH_SITE_ID";
    pub const DATA_PATH: &str = "KIOSKWATCH_DATA_PATH";
    pub const REMOTE_URL: &str = "KIOSKWATCH_REMOTE_URL";
    pub const REMOTE_TIMEOUT_SECS: &str = "KIOSKWATCH_REMOTE_TIMEOUT_SECS";
    pub const API_KEY: &str = "KIOSKWATCH_API_KEY";
    pub const HOST: &str = "KIOSKWATCH_HOST";
    pub const PORT: &str = "KIOSKWATCH_PORT";
    pub const CORS: &str = "KIOSKWATCH_CORS";
    pub const LOG_JSON: &str = "KIOSKWATCH_LOG_JSON";
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

fn invalid(name: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Emit permissive CORS headers for browser dashboards.
    pub cors: bool,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::HOST.to_string(),
            port: defaults::PORT,
            cors: true,
            max_body_bytes: defaults::MAX_BODY_BYTES,
        }
    }
}

impl ServerConfig {
    /// Resolve the listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| invalid("server.host", e.to_string()))?
            .next()
            .ok_or_else(|| invalid("server.host", format!("{} does not resolve", self.host)))
    }
}

/// Status store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// Store name, used as the namespace on shared backends.
    pub store_name: String,
    /// Access token for the remote backend.
    pub token: Option<String>,
    /// Site (tenant) the remote store belongs to.
    pub site_id: String,
    /// Database file for the redb backend.
    pub path: String,
    /// Base URL of the remote blob service.
    pub base_url: Option<String>,
    /// Per-request timeout for the remote backend.
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Memory,
            store_name: defaults::STORE_NAME.to_string(),
            token: None,
            site_id: defaults::SITE_ID.to_string(),
            path: defaults::DATA_PATH.to_string(),
            base_url: None,
            timeout_secs: defaults::REMOTE_TIMEOUT_SECS,
        }
    }
}

impl StoreConfig {
    /// In-memory store with default naming.
    pub fn memory() -> Self {
        Self::default()
    }

    /// redb store at `path`.
    pub fn redb(path: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Redb,
            path: path.into(),
            ..Self::default()
        }
    }

    /// Remote store at `base_url`.
    pub fn remote(base_url: impl Into<String>) -> Self {
        Self {
            backend: BackendKind::Remote,
            base_url: Some(base_url.into()),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_site_id(mut self, site_id: impl Into<String>) -> Self {
        self.site_id = site_id.into();
        self
    }

    pub fn with_store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = name.into();
        self
    }

    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.store_name.trim().is_empty() {
            return Err(invalid("store.store_name", "must not be empty"));
        }
        match self.backend {
            BackendKind::Memory => {}
            BackendKind::Redb => {
                if self.path.trim().is_empty() {
                    return Err(invalid("store.path", "required for the redb backend"));
                }
            }
            BackendKind::Remote => {
                let url = self.base_url.as_deref().unwrap_or("").trim();
                if url.is_empty() {
                    return Err(invalid("store.base_url", "required for the remote backend"));
                }
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(invalid("store.base_url", format!("{} is not an http(s) URL", url)));
                }
                if self.site_id.trim().is_empty() {
                    return Err(invalid("store.site_id", "must not be empty"));
                }
                if self.timeout_secs == 0 {
                    return Err(invalid("store.timeout_secs", "must be greater than zero"));
                }
            }
        }
        Ok(())
    }
}

/// Access control settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Shared secret required on `POST /report`. `None` disables the check.
    pub api_key: Option<String>,
}

impl AuthConfig {
    pub fn validate(&self) -> Result<()> {
        match &self.api_key {
            Some(key) if key.trim().is_empty() => Err(invalid("auth.api_key", "must not be empty")),
            _ => Ok(()),
        }
    }
}

/// Complete collector configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub auth: AuthConfig,
}

impl RegistryConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Read a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Resolve file and environment sources.
    ///
    /// An explicit `path` must exist; without one, `kioskwatch.toml` in the
    /// working directory is used when present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                info!(category = "config", "Loading config from: {}", path.display());
                Self::from_file(path)?
            }
            None => {
                let default_path = Path::new(defaults::CONFIG_FILE);
                if default_path.exists() {
                    info!(category = "config", "Loading config from: {}", defaults::CONFIG_FILE);
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Overlay values from `lookup`. Unset and empty variables leave the
    /// current value untouched.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(env_vars::BACKEND) {
            self.store.backend = v
                .parse::<BackendKind>()
                .map_err(|e| invalid(env_vars::BACKEND, e.to_string()))?;
        }
        if let Some(v) = get(env_vars::STORE_NAME) {
            self.store.store_name = v;
        }
        if let Some(v) = get(env_vars::STORE_TOKEN) {
            self.store.token = Some(v);
        }
        if let Some(v) = get(env_vars::SITE_ID) {
            self.store.site_id = v;
        }
        if let Some(v) = get(env_vars::DATA_PATH) {
            self.store.path = v;
        }
        if let Some(v) = get(env_vars::REMOTE_URL) {
            self.store.base_url = Some(v);
        }
        if let Some(v) = get(env_vars::REMOTE_TIMEOUT_SECS) {
            self.store.timeout_secs = parse_var(env_vars::REMOTE_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = get(env_vars::API_KEY) {
            self.auth.api_key = Some(v);
        }
        if let Some(v) = get(env_vars::HOST) {
            self.server.host = v;
        }
        if let Some(v) = get(env_vars::PORT) {
            self.server.port = parse_var(env_vars::PORT, &v)?;
        }
        if let Some(v) = get(env_vars::CORS) {
            self.server.cors = parse_var(env_vars::CORS, &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.max_body_bytes == 0 {
            return Err(invalid("server.max_body_bytes", "must be greater than zero"));
        }
        self.store.validate()?;
        self.auth.validate()
    }

    /// Copy with secrets replaced, for display and logging.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.store.token = copy.store.token.as_ref().map(|_| "(set)".to_string());
        copy.auth.api_key = copy.auth.api_key.as_ref().map(|_| "(set)".to_string());
        copy
    }
}

fn parse_var<T>(name: &str, raw: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| invalid(name, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RegistryConfig::default();
        assert_eq!(config.store.backend, BackendKind::Memory);
        assert_eq!(config.store.store_name, "kiosk-status");
        assert_eq!(config.store.site_id, "winnetworkhealthmonitor");
        assert!(config.auth.api_key.is_none());
        assert!(config.server.cors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let mut config = RegistryConfig::default();
        config
            .apply_overrides(lookup(&[
                (env_vars::BACKEND, "remote"),
                (env_vars::REMOTE_URL, "https://blobs.example.com/api/v1/blobs"),
                (env_vars::STORE_TOKEN, "secret-token"),
                (env_vars::SITE_ID, "site-42"),
                (env_vars::PORT, "9000"),
                (env_vars::CORS, "false"),
            ]))
            .unwrap();

        assert_eq!(config.store.backend, BackendKind::Remote);
        assert_eq!(config.store.site_id, "site-42");
        assert_eq!(config.store.token.as_deref(), Some("secret-token"));
        assert_eq!(config.server.port, 9000);
        assert!(!config.server.cors);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_env_keeps_defaults() {
        let mut config = RegistryConfig::default();
        config
            .apply_overrides(lookup(&[(env_vars::SITE_ID, ""), (env_vars::STORE_NAME, "  ")]))
            .unwrap();
        assert_eq!(config.store.site_id, defaults::SITE_ID);
        assert_eq!(config.store.store_name, defaults::STORE_NAME);
    }

    #[test]
    fn test_unknown_backend_fails_fast() {
        let mut config = RegistryConfig::default();
        let err = config
            .apply_overrides(lookup(&[(env_vars::BACKEND, "netlify")]))
            .unwrap_err();
        assert!(err.to_string().contains(env_vars::BACKEND));
    }

    #[test]
    fn test_bad_port_fails_fast() {
        let mut config = RegistryConfig::default();
        assert!(config
            .apply_overrides(lookup(&[(env_vars::PORT, "eighty")]))
            .is_err());
    }

    #[test]
    fn test_remote_requires_url() {
        let mut config = RegistryConfig::default();
        config.store.backend = BackendKind::Remote;
        assert!(config.validate().is_err());

        config.store.base_url = Some("ftp://example.com".to_string());
        assert!(config.validate().is_err());

        config.store.base_url = Some("http://127.0.0.1:9999".to_string());
        assert!(config.validate().is_ok());

        config.store.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        let mut config = RegistryConfig::default();
        config.auth.api_key = Some(" ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_config() {
        let config = RegistryConfig::from_toml_str(
            r#"
            [server]
            port = 7000

            [store]
            backend = "redb"
            path = "/var/lib/kioskwatch/status.redb"

            [auth]
            api_key = "k1"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.server.host, defaults::HOST);
        assert_eq!(config.store.backend, BackendKind::Redb);
        assert_eq!(config.store.path, "/var/lib/kioskwatch/status.redb");
        assert_eq!(config.auth.api_key.as_deref(), Some("k1"));
    }

    #[test]
    fn test_toml_unknown_option_rejected() {
        let result = RegistryConfig::from_toml_str(
            r#"
            [store]
            backend = "memory"
            flavour = "vanilla"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_file_missing() {
        let result = RegistryConfig::from_file(Path::new("/nonexistent/kioskwatch.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kioskwatch.toml");
        std::fs::write(&path, "[store]\nstore_name = \"lobby\"\n").unwrap();

        let config = RegistryConfig::from_file(&path).unwrap();
        assert_eq!(config.store.store_name, "lobby");
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = RegistryConfig::default();
        config.store.token = Some("super-secret".to_string());
        config.auth.api_key = Some("another-secret".to_string());

        let redacted = config.redacted();
        assert_eq!(redacted.store.token.as_deref(), Some("(set)"));
        assert_eq!(redacted.auth.api_key.as_deref(), Some("(set)"));
        assert_eq!(config.store.token.as_deref(), Some("super-secret"));
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            ..ServerConfig::default()
        };
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
    }
}

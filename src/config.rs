//! Client configuration.
//!
//! Settings come from an optional TOML file. Every field has a default, so
//! an empty file (or no file at all) yields a working local configuration:
//!
//! ```toml
//! rpc_url = "http://localhost:26657"
//! key_dir = "./config"
//! timeout_secs = 30
//!
//! [retry]
//! max_retries = 1
//! base_delay_ms = 200
//! max_delay_ms = 2000
//!
//! [headers]
//! Authorization = "Bearer <token>"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::{DEFAULT_KEY_DIR, DEFAULT_RPC_URL};
use crate::rpc::{RetryConfig, DEFAULT_TIMEOUT_SECS};

/// Configuration load or validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// CometBFT RPC endpoint
    pub rpc_url: String,
    /// Directory holding `ed25519.key` and `ed25519.pub`
    pub key_dir: PathBuf,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Transport retry policy
    pub retry: RetryConfig,
    /// Extra HTTP headers sent with every request
    pub headers: BTreeMap<String, String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            key_dir: PathBuf::from(DEFAULT_KEY_DIR),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry: RetryConfig::default(),
            headers: BTreeMap::new(),
        }
    }
}

impl ClientConfig {
    /// Load and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), rpc_url = %config.rpc_url, "loaded config");
        Ok(config)
    }

    /// Parse and validate TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, otherwise use defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Check URL scheme, timeout, key dir, retry bounds and header names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.rpc_url)
            .map_err(|e| ConfigError::Invalid(format!("Invalid rpc_url '{}': {}", self.rpc_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "rpc_url must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be > 0".to_string()));
        }
        if self.key_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("key_dir must not be empty".to_string()));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(ConfigError::Invalid(
                "retry.base_delay_ms must not exceed retry.max_delay_ms".to_string(),
            ));
        }
        for (name, value) in &self.headers {
            reqwest::header::HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ConfigError::Invalid(format!("Invalid header name '{name}'")))?;
            reqwest::header::HeaderValue::from_str(value)
                .map_err(|_| ConfigError::Invalid(format!("Invalid value for header '{name}'")))?;
        }
        Ok(())
    }
}

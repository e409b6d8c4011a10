//! Provider configuration.
//!
//! Configuration is loaded from a TOML file (default: `pipefy.toml`) and
//! completed from the environment. Values present in the file win.
//!
//! ```toml
//! endpoint = "https://api.pipefy.com/graphql"
//! token = "..."
//! # or
//! client_id = "..."
//! client_secret = "..."
//! token_url = "https://app.pipefy.com/oauth/token"
//! request_timeout_secs = 30
//! ```

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Static token.
pub const ENV_TOKEN: &str = "PIPEFY_TOKEN";
/// OAuth2 client id.
pub const ENV_CLIENT_ID: &str = "PIPEFY_CLIENT_ID";
/// OAuth2 client secret.
pub const ENV_CLIENT_SECRET: &str = "PIPEFY_CLIENT_SECRET";
/// OAuth2 token endpoint.
pub const ENV_TOKEN_URL: &str = "PIPEFY_TOKEN_URL";

/// A credential that is wiped from memory on drop and never printed.
#[derive(Clone, PartialEq, Eq, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a credential.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The credential itself. Only for building requests.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Whether the credential is blank.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret([REDACTED])")
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse config file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the config file.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: toml::de::Error,
    },

    /// Neither a static token nor client credentials are available.
    #[error(
        "missing credentials: set `token` (PIPEFY_TOKEN) or both `client_id` and \
         `client_secret` (PIPEFY_CLIENT_ID, PIPEFY_CLIENT_SECRET)"
    )]
    MissingCredentials,

    /// A value is present but unusable.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Provider configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    /// GraphQL endpoint (default: `https://api.pipefy.com/graphql`).
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Static bearer token.
    #[serde(default)]
    pub token: Option<Secret>,
    /// OAuth2 client id.
    #[serde(default)]
    pub client_id: Option<String>,
    /// OAuth2 client secret.
    #[serde(default)]
    pub client_secret: Option<Secret>,
    /// OAuth2 token endpoint (default: `https://app.pipefy.com/oauth/token`).
    #[serde(default)]
    pub token_url: Option<String>,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Default value functions
fn default_endpoint() -> String {
    "https://api.pipefy.com/graphql".to_string()
}

fn default_token_url() -> String {
    "https://app.pipefy.com/oauth/token".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            token: None,
            client_id: None,
            client_secret: None,
            token_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// OAuth2 client-credentials settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    /// Client id.
    pub client_id: String,
    /// Client secret.
    pub client_secret: Secret,
    /// Token endpoint.
    pub token_url: String,
}

/// The credentials a channel authorizes with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Fixed bearer token.
    Static(Secret),
    /// Token obtained and refreshed through OAuth2 client credentials.
    ClientCredentials(ClientCredentials),
}

impl ProviderConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Fill unset values from the process environment.
    pub fn with_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Fill unset values from `lookup`.
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if self.token.is_none() {
            self.token = env(ENV_TOKEN).map(Secret::new);
        }
        if self.client_id.is_none() {
            self.client_id = env(ENV_CLIENT_ID);
        }
        if self.client_secret.is_none() {
            self.client_secret = env(ENV_CLIENT_SECRET).map(Secret::new);
        }
        if self.token_url.is_none() {
            self.token_url = env(ENV_TOKEN_URL);
        }
        self
    }

    /// Per-request timeout.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolve which credentials to use.
    ///
    /// A static token is preferred; otherwise client id and secret select
    /// the OAuth2 channel. Blank values count as unset.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        if let Some(token) = self.token.as_ref().filter(|t| !t.is_blank()) {
            return Ok(Credentials::Static(token.clone()));
        }

        let client_id = self.client_id.as_deref().filter(|id| !id.trim().is_empty());
        let client_secret = self.client_secret.as_ref().filter(|s| !s.is_blank());
        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => {
                let token_url = self
                    .token_url
                    .clone()
                    .filter(|url| !url.trim().is_empty())
                    .unwrap_or_else(default_token_url);
                Ok(Credentials::ClientCredentials(ClientCredentials {
                    client_id: client_id.to_string(),
                    client_secret: client_secret.clone(),
                    token_url,
                }))
            }
            _ => Err(ConfigError::MissingCredentials),
        }
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint is empty".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }
        self.credentials().map(|_| ())
    }
}

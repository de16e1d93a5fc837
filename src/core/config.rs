//! Configuration management

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::errors::{LaraError, Result};

/// Default Lara API endpoint
pub const DEFAULT_SERVER_URL: &str = "https://api.laratranslate.com";

/// Default delay between two job status fetches
pub const DEFAULT_POLLING_INTERVAL: Duration = Duration::from_millis(2000);

/// Access key pair used to sign requests
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_key_id: String,
    access_key_secret: String,
}

impl Credentials {
    /// Create credentials, rejecting empty values
    pub fn new(
        access_key_id: impl Into<String>,
        access_key_secret: impl Into<String>,
    ) -> Result<Self> {
        let access_key_id = access_key_id.into();
        let access_key_secret = access_key_secret.into();

        if access_key_id.is_empty() {
            return Err(LaraError::ConfigError {
                message: "Access key ID cannot be empty".to_string(),
            });
        }
        if access_key_secret.is_empty() {
            return Err(LaraError::ConfigError {
                message: "Access key secret cannot be empty".to_string(),
            });
        }

        Ok(Self {
            access_key_id,
            access_key_secret,
        })
    }

    /// Load from `LARA_ACCESS_KEY_ID` and `LARA_ACCESS_KEY_SECRET`
    pub fn from_env() -> Result<Self> {
        let access_key_id = std::env::var("LARA_ACCESS_KEY_ID").map_err(|_| LaraError::ConfigError {
            message: "LARA_ACCESS_KEY_ID environment variable is required".to_string(),
        })?;
        let access_key_secret =
            std::env::var("LARA_ACCESS_KEY_SECRET").map_err(|_| LaraError::ConfigError {
                message: "LARA_ACCESS_KEY_SECRET environment variable is required".to_string(),
            })?;

        Self::new(access_key_id, access_key_secret)
    }

    pub fn access_key_id(&self) -> &str {
        &self.access_key_id
    }

    pub fn access_key_secret(&self) -> &str {
        &self.access_key_secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"<redacted>")
            .finish()
    }
}

/// Client-wide transport options
#[derive(Debug, Clone)]
pub struct ClientOptions {
    server_url: String,
    connection_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    polling_interval: Duration,
    extra_headers: BTreeMap<String, String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            connection_timeout: None,
            read_timeout: None,
            polling_interval: DEFAULT_POLLING_INTERVAL,
            extra_headers: BTreeMap::new(),
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server URL; trailing slashes are stripped
    pub fn with_server_url(mut self, server_url: impl Into<String>) -> Self {
        let server_url = server_url.into();
        let trimmed = server_url.trim_end_matches('/');
        self.server_url = if trimmed.is_empty() {
            DEFAULT_SERVER_URL.to_string()
        } else {
            trimmed.to_string()
        };
        self
    }

    /// Zero disables the timeout
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Zero disables the timeout
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn with_polling_interval(mut self, interval: Duration) -> Self {
        self.polling_interval = interval;
        self
    }

    /// Header sent with every request
    pub fn with_extra_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn connection_timeout(&self) -> Option<Duration> {
        self.connection_timeout
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn polling_interval(&self) -> Duration {
        self.polling_interval
    }

    pub fn extra_headers(&self) -> &BTreeMap<String, String> {
        &self.extra_headers
    }
}

/// Settings read from a config file and `LARA_*` environment variables
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaraSettings {
    #[serde(default)]
    pub access_key_id: Option<String>,
    #[serde(default)]
    pub access_key_secret: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default)]
    pub connection_timeout_ms: Option<u64>,
    #[serde(default)]
    pub read_timeout_ms: Option<u64>,
    #[serde(default)]
    pub polling_interval_ms: Option<u64>,
}

impl LaraSettings {
    /// Layer an optional config file under the `LARA_` environment
    pub fn load(file: Option<&Path>) -> Result<Self> {
        Self::load_with_env(file, None)
    }

    /// Like [`LaraSettings::load`], reading `LARA_*` variables from `env`
    /// instead of the process environment when given
    pub fn load_with_env(
        file: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = file {
            debug!("Reading settings from {}", path.display());
            builder = builder.add_source(config::File::from(path).required(false));
        }

        // Values stay strings: numeric fields are converted on deserialize,
        // credentials such as `00123` are kept verbatim
        let settings: Self = builder
            .add_source(config::Environment::with_prefix("LARA").source(env))
            .build()?
            .try_deserialize()?;

        info!(
            server_url = settings.server_url.as_deref().unwrap_or(DEFAULT_SERVER_URL),
            "Loaded Lara settings"
        );
        Ok(settings)
    }

    /// Credentials from these settings
    pub fn credentials(&self) -> Result<Credentials> {
        let access_key_id = self.access_key_id.clone().ok_or_else(|| LaraError::ConfigError {
            message: "access_key_id is required (LARA_ACCESS_KEY_ID)".to_string(),
        })?;
        let access_key_secret =
            self.access_key_secret
                .clone()
                .ok_or_else(|| LaraError::ConfigError {
                    message: "access_key_secret is required (LARA_ACCESS_KEY_SECRET)".to_string(),
                })?;

        Credentials::new(access_key_id, access_key_secret)
    }

    /// Client options from these settings, defaults for anything unset
    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::default();
        if let Some(url) = &self.server_url {
            options = options.with_server_url(url.as_str());
        }
        if let Some(ms) = self.connection_timeout_ms {
            options = options.with_connection_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.read_timeout_ms {
            options = options.with_read_timeout(Duration::from_millis(ms));
        }
        if let Some(ms) = self.polling_interval_ms {
            options = options.with_polling_interval(Duration::from_millis(ms));
        }
        options
    }
}

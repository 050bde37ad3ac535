//! Relay configuration.
//!
//! Loaded once at startup from an optional TOML file overlaid with
//! `ASTER_`-prefixed environment variables, validated, then shared
//! read-only.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use aster_core::DEFAULT_RECV_WINDOW;
use aster_signer::{
    parse_address, DelegatedSigner, HmacSigner, KeyManager, KeySource, NonceManager,
    RequestSigner, SecretString, SharedClock, SigningScheme,
};
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// Environment prefix for every overridable field.
pub const ENV_PREFIX: &str = "ASTER";

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port. Default: 8000.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Exchange order endpoint.
    #[serde(default = "default_order_url")]
    pub order_url: String,
    /// Dry-run: sign and echo the request instead of sending it. Default: true.
    #[serde(default = "default_test_mode")]
    pub test_mode: bool,
    /// `recvWindow` applied when the webhook omits it (ms).
    #[serde(default = "default_recv_window")]
    pub recv_window: u64,
    /// Outbound HTTP timeout (ms). Default: 10,000.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub scheme: SigningScheme,

    // HMAC scheme
    #[serde(default)]
    pub api_key: Option<SecretString>,
    #[serde(default)]
    pub api_secret: Option<SecretString>,

    // Delegated scheme
    /// Account the order is placed for.
    #[serde(default)]
    pub user: Option<String>,
    /// Address of the delegated key; must match the loaded key.
    #[serde(default)]
    pub signer: Option<String>,
    /// Env var holding the hex signer key. Default: `ASTER_SIGNER_KEY`.
    #[serde(default = "default_signer_key_env")]
    pub signer_key_env: String,
    /// File holding the hex signer key. Takes precedence over the env var.
    #[serde(default)]
    pub signer_key_file: Option<PathBuf>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_order_url() -> String {
    "https://fapi.asterdex.com/fapi/v3/order".to_string()
}

fn default_test_mode() -> bool {
    true
}

fn default_recv_window() -> u64 {
    DEFAULT_RECV_WINDOW
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_signer_key_env() -> String {
    "ASTER_SIGNER_KEY".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            order_url: default_order_url(),
            test_mode: default_test_mode(),
            recv_window: default_recv_window(),
            request_timeout_ms: default_request_timeout_ms(),
            scheme: SigningScheme::default(),
            api_key: None,
            api_secret: None,
            user: None,
            signer: None,
            signer_key_env: default_signer_key_env(),
            signer_key_file: None,
        }
    }
}

impl AppConfig {
    /// Load from an optional TOML file, then apply `ASTER_*` env overrides.
    ///
    /// A missing file is not an error; every field has a default or comes
    /// from the environment. Env values stay strings until deserialization
    /// so credentials like `000123` are not coerced into numbers.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);

        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name(path).required(false))
            .add_source(::config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        settings
            .try_deserialize()
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Parse TOML text without consulting the environment.
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check that the material the selected scheme needs is present.
    ///
    /// Delegated key loading happens in [`Self::build_signer`]; this only
    /// checks what can be checked without touching secrets.
    pub fn validate(&self) -> AppResult<()> {
        if !self.order_url.starts_with("http://") && !self.order_url.starts_with("https://") {
            return Err(AppError::Config(format!(
                "order_url must be an http(s) URL, got {:?}",
                self.order_url
            )));
        }
        if self.recv_window == 0 {
            return Err(AppError::Config("recv_window must be positive".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(AppError::Config("request_timeout_ms must be positive".into()));
        }

        match self.scheme {
            SigningScheme::Hmac => {
                require_text("api_key", self.api_key.as_ref().map(SecretString::expose))?;
                if self.api_secret.as_ref().map_or(true, SecretString::is_empty) {
                    return Err(missing("api_secret"));
                }
            }
            SigningScheme::Delegated => {
                parse_address(require_text("user", self.user.as_deref())?)?;
                parse_address(require_text("signer", self.signer.as_deref())?)?;
                if self.signer_key_file.is_none() && self.signer_key_env.trim().is_empty() {
                    return Err(missing("signer_key_file or signer_key_env"));
                }
            }
        }
        Ok(())
    }

    /// Where the delegated signer key is read from.
    pub fn key_source(&self) -> KeySource {
        match &self.signer_key_file {
            Some(path) => KeySource::File { path: path.clone() },
            None => KeySource::EnvVar {
                var_name: self.signer_key_env.clone(),
            },
        }
    }

    /// Build the signer for the configured scheme.
    pub fn build_signer(&self, clock: SharedClock) -> AppResult<RequestSigner> {
        self.build_signer_with(self.key_source(), clock)
    }

    /// Build the signer, reading the delegated key from `source`.
    pub fn build_signer_with(
        &self,
        source: KeySource,
        clock: SharedClock,
    ) -> AppResult<RequestSigner> {
        self.validate()?;

        match self.scheme {
            SigningScheme::Hmac => {
                let api_key =
                    require_text("api_key", self.api_key.as_ref().map(SecretString::expose))?;
                let api_secret = self.api_secret.clone().ok_or_else(|| missing("api_secret"))?;
                Ok(HmacSigner::new(api_key, api_secret).into())
            }
            SigningScheme::Delegated => {
                let user = parse_address(require_text("user", self.user.as_deref())?)?;
                let signer = parse_address(require_text("signer", self.signer.as_deref())?)?;
                let key_manager = KeyManager::load(source, Some(signer))?;
                Ok(DelegatedSigner::new(Arc::new(key_manager), user, NonceManager::new(clock)).into())
            }
        }
    }
}

fn missing(field: &str) -> AppError {
    AppError::Config(format!("{field} is required for the configured signing scheme"))
}

fn require_text<'a>(field: &str, value: Option<&'a str>) -> AppResult<&'a str> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text),
        _ => Err(missing(field)),
    }
}

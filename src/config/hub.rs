//! Hub connection settings and credential resolution.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

use crate::constants::{DEFAULT_MAX_DEPTH, DEFAULT_TIMEOUT_SECS, MAX_PAGE_SIZE, env};
use crate::core::HubError;
use crate::resolver::{ErrorPolicy, ResolveOptions};

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_page_size() -> usize {
    MAX_PAGE_SIZE
}

const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Credential material for the hub.
///
/// Any field may be empty; [`Credentials::resolve`] decides which method is
/// used. `Debug` output never contains the secrets themselves.
#[derive(Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    /// API token, preferred over username/password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    /// Username for password authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Password for password authentication.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// The authentication method chosen from a [`Credentials`] value.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthMethod {
    /// Exchange an API token for a bearer token.
    ApiToken(String),
    /// Log in with username and password.
    Password {
        /// Login name
        username: String,
        /// Login password
        password: String,
    },
}

impl fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiToken(_) => f.write_str("ApiToken(<redacted>)"),
            Self::Password {
                username,
                ..
            } => f.debug_struct("Password").field("username", username).finish_non_exhaustive(),
        }
    }
}

fn non_empty(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.trim().is_empty())
}

impl Credentials {
    /// Credentials holding only an API token.
    pub fn token(token: impl Into<String>) -> Self {
        Self {
            api_token: Some(token.into()),
            ..Self::default()
        }
    }

    /// Credentials holding a username and password.
    pub fn password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            api_token: None,
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    /// Pick the authentication method: API token first, then username/password.
    ///
    /// Blank values count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Auth`] with `missing credentials` when neither a
    /// token nor a complete username/password pair is available.
    pub fn resolve(&self) -> Result<AuthMethod, HubError> {
        if let Some(token) = non_empty(self.api_token.as_ref()) {
            return Ok(AuthMethod::ApiToken(token.to_string()));
        }

        match (non_empty(self.username.as_ref()), non_empty(self.password.as_ref())) {
            (Some(username), Some(password)) => Ok(AuthMethod::Password {
                username: username.to_string(),
                password: password.to_string(),
            }),
            _ => Err(HubError::Auth {
                reason: "missing credentials".to_string(),
            }),
        }
    }

    /// True when no credential field is set.
    pub fn is_empty(&self) -> bool {
        self.api_token.is_none() && self.username.is_none() && self.password.is_none()
    }

    /// Overwrite and drop all credential material.
    pub fn clear(&mut self) {
        for secret in [&mut self.api_token, &mut self.password].into_iter().flatten() {
            secret.clear();
        }
        self.api_token = None;
        self.username = None;
        self.password = None;
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credentials")
            .field("api_token", &redact(&self.api_token))
            .field("username", &self.username)
            .field("password", &redact(&self.password))
            .finish()
    }
}

/// Everything needed to open a [`Session`](crate::hub::Session) and run a resolution.
///
/// Values are layered: config file, then `BD_*` environment overrides via
/// [`HubConfig::with_env_overrides`], then command-line flags.
///
/// ```toml
/// base_url = "https://blackduck.example.com"
/// insecure = false
/// timeout_secs = 30
/// page_size = 1000
/// max_depth = 32
/// policy = "lenient"
///
/// [credentials]
/// api_token = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HubConfig {
    /// Hub base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Skip TLS certificate verification.
    #[serde(default)]
    pub insecure: bool,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Items requested per listing page (capped at 1000).
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Maximum group nesting depth followed.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// What to do when a subtree or project fails to load.
    #[serde(default)]
    pub policy: ErrorPolicy,

    /// Credential material. Kept last so it serializes as a trailing table.
    #[serde(default, skip_serializing_if = "Credentials::is_empty")]
    pub credentials: Credentials,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            insecure: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            page_size: MAX_PAGE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            policy: ErrorPolicy::default(),
            credentials: Credentials::default(),
        }
    }
}

impl HubConfig {
    /// Config with a base URL and credentials, everything else defaulted.
    pub fn new(base_url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: Some(base_url.into()),
            credentials,
            ..Self::default()
        }
    }

    /// Load the config file from `path`, or from [`HubConfig::default_path`].
    ///
    /// A missing file yields the default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load_with_optional(path: Option<PathBuf>) -> Result<Self> {
        let path = match path {
            Some(path) => path,
            None => Self::default_path()?,
        };
        if path.exists() {
            Self::load_from(&path).await
        } else {
            debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load the config file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        if config.timeout_secs == 0 {
            bail!("Invalid config in {}: timeout_secs must be at least 1", path.display());
        }
        Ok(config)
    }

    /// Write the config as TOML, creating parent directories.
    ///
    /// On Unix the file is restricted to the owner since it may hold tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write config to {}", path.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mut perms = fs::metadata(path)
                .await
                .with_context(|| format!("Failed to read permissions for {}", path.display()))?
                .permissions();
            perms.set_mode(0o600);
            fs::set_permissions(path, perms).await.with_context(|| {
                format!("Failed to set secure permissions on {}", path.display())
            })?;
        }

        Ok(())
    }

    /// Default config location: `~/.bdmetrics/config.toml`
    /// (`%LOCALAPPDATA%\bdmetrics\config.toml` on Windows).
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = if cfg!(target_os = "windows") {
            dirs::data_local_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine local data directory"))?
                .join("bdmetrics")
        } else {
            dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?
                .join(".bdmetrics")
        };

        Ok(config_dir.join("config.toml"))
    }

    /// Apply `BD_*` overrides obtained through `lookup`.
    ///
    /// The binary passes a process-environment lookup; tests pass closures.
    /// Blank values are ignored, and unparsable numbers are logged and ignored.
    #[must_use]
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(env::BD_URL) {
            self.base_url = Some(url);
        }
        if let Some(token) = get(env::BD_API_TOKEN) {
            self.credentials.api_token = Some(token);
        }
        if let Some(username) = get(env::BD_USERNAME) {
            self.credentials.username = Some(username);
        }
        if let Some(password) = get(env::BD_PASSWORD) {
            self.credentials.password = Some(password);
        }
        if let Some(insecure) = get(env::BD_INSECURE) {
            self.insecure = matches!(insecure.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        if let Some(timeout) = get(env::BD_TIMEOUT) {
            match timeout.trim().parse::<u64>() {
                Ok(0) => warn!("Ignoring {}=0: the timeout must be at least one second", env::BD_TIMEOUT),
                Ok(secs) => self.timeout_secs = secs,
                Err(_) => warn!("Ignoring {}={timeout}: not a number of seconds", env::BD_TIMEOUT),
            }
        }

        self
    }

    /// The base URL without trailing path separators.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Config`] when no (non-blank) base URL is configured.
    pub fn normalized_base_url(&self) -> Result<String, HubError> {
        let url = self.base_url.as_deref().map(str::trim).unwrap_or_default();
        let url = url.trim_end_matches('/');
        if url.is_empty() {
            return Err(HubError::Config {
                message: "Black Duck URL must be provided with --bd-url or BD_URL".to_string(),
            });
        }
        Ok(url.to_string())
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The per-request timeout, rejecting zero, which would fail every request.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Config`] when `timeout_secs` is 0.
    pub fn checked_timeout(&self) -> Result<Duration, HubError> {
        if self.timeout_secs == 0 {
            return Err(HubError::Config {
                message: "timeout must be at least 1 second".to_string(),
            });
        }
        Ok(self.timeout())
    }

    /// Traversal options derived from this config.
    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            page_size: self.page_size,
            max_depth: self.max_depth,
            policy: self.policy,
        }
    }
}

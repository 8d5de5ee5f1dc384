//! Configuration loading for florad.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.flora/config.toml` (user)
//! 3. `/etc/flora/config.toml` (system)
//! 4. built-in defaults
//!
//! `PORT` and `FRONTEND_URL` in the environment override the file.
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.flora/secrets.toml` (user, must be 0600)
//! 2. `/etc/flora/secrets.toml` (system, must be 0600)
//! 3. `PLANT_ID_API_KEY` environment variable

use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::providers::InvasiveSpecies;
use crate::providers::plant_id::DEFAULT_BASE_URL;
use crate::{FloraError, Result};

/// Environment variable overriding the listening port.
pub const PORT_ENV: &str = "PORT";
/// Environment variable overriding the allowed CORS origin.
pub const ALLOWED_ORIGIN_ENV: &str = "FRONTEND_URL";
/// Environment variable holding the Plant.id API key.
pub const API_KEY_ENV: &str = "PLANT_ID_API_KEY";

/// Server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub invasive: InvasiveConfig,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind to (default: 0.0.0.0).
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on (default: 5000).
    #[serde(default = "default_port")]
    pub port: u16,
    /// The single origin allowed to make cross-origin requests
    /// (default: http://localhost:3000).
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            allowed_origin: default_allowed_origin(),
            limits: LimitsConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Listening address. `host` is an IP literal, v4 or v6 (e.g. `::`).
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self.host.trim().parse().map_err(|e| {
            FloraError::Configuration(format!("Invalid host {:?}: {e}", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_allowed_origin() -> String {
    "http://localhost:3000".to_string()
}

/// Resource limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Requests allowed per client address per window (default: 100).
    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u32,
    /// Rate limit window in seconds (default: 900).
    #[serde(default = "default_rate_limit_window")]
    pub rate_limit_window_secs: u64,
    /// Upper bound on the provider lookup in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Largest accepted upload body in bytes (default: 10 MiB).
    #[serde(default = "default_max_upload")]
    pub max_upload_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_secs: default_rate_limit_window(),
            request_timeout_secs: default_timeout(),
            max_upload_bytes: default_max_upload(),
        }
    }
}

impl LimitsConfig {
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_rate_limit_max() -> u32 {
    100
}

fn default_rate_limit_window() -> u64 {
    15 * 60
}

fn default_timeout() -> u64 {
    30
}

fn default_max_upload() -> usize {
    10 * 1024 * 1024
}

/// Identification provider configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Plant.id base URL (default: https://api.plant.id/v2).
    #[serde(default = "default_provider_url")]
    pub base_url: String,
    /// Provider HTTP timeout in seconds (default: 30).
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_provider_url(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_provider_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Invasive species list configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct InvasiveConfig {
    /// Additional (or replacement) species names.
    #[serde(default)]
    pub species: Vec<String>,
    /// Keep the built-in list and add `species` to it (default: true).
    #[serde(default = "default_true")]
    pub extend_defaults: bool,
}

impl Default for InvasiveConfig {
    fn default() -> Self {
        Self {
            species: Vec::new(),
            extend_defaults: true,
        }
    }
}

fn default_true() -> bool {
    true
}

impl InvasiveConfig {
    /// Build the lookup list this configuration describes.
    pub fn build(&self) -> InvasiveSpecies {
        let base = if self.extend_defaults {
            InvasiveSpecies::default()
        } else {
            InvasiveSpecies::none()
        };
        base.extend(&self.species)
    }
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub plant_id: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

impl Config {
    /// Load configuration from the standard locations, then apply
    /// environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path)?,
            None => Config::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FloraError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            FloraError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path. `None` means "use defaults".
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(FloraError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".flora").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/flora/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// Apply `PORT` and `FRONTEND_URL` overrides from `lookup`.
    pub fn apply_env_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<()> {
        if let Some(port) = lookup(PORT_ENV).filter(|p| !p.trim().is_empty()) {
            self.server.port = port.trim().parse().map_err(|e| {
                FloraError::Configuration(format!("Invalid {PORT_ENV} value {port:?}: {e}"))
            })?;
        }
        if let Some(origin) = lookup(ALLOWED_ORIGIN_ENV).filter(|o| !o.trim().is_empty()) {
            self.server.allowed_origin = origin.trim().to_string();
        }
        Ok(())
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Returns empty secrets if no file exists (the key may come from the
    /// environment instead).
    pub fn load() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".flora").join("secrets.toml");
            if user_secrets.exists() {
                Self::check_permissions(&user_secrets)?;
                return Self::load_from_file(&user_secrets);
            }
        }

        let system_secrets = PathBuf::from("/etc/flora/secrets.toml");
        if system_secrets.exists() {
            Self::check_permissions(&system_secrets)?;
            return Self::load_from_file(&system_secrets);
        }

        Ok(Secrets::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FloraError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            FloraError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    pub fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            FloraError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(FloraError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    pub fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// The Plant.id API key, falling back to `PLANT_ID_API_KEY`.
    pub fn plant_id_key(&self) -> Option<String> {
        self.plant_id
            .as_ref()
            .map(|s| s.api_key.clone())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}

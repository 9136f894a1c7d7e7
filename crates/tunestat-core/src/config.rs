//! Configuration management for tunestat.
//!
//! Loads configuration from ${TUNESTAT_HOME}/config.toml with sensible defaults,
//! then applies `TUNESTAT_*` environment overrides.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// Env var overriding `backend_url`.
pub const ENV_BACKEND_URL: &str = "TUNESTAT_BACKEND_URL";
/// Env var overriding `session_cookie`.
pub const ENV_SESSION_COOKIE: &str = "TUNESTAT_SESSION_COOKIE";
/// Env var that disables opening a browser (tests, headless hosts).
pub const ENV_NO_BROWSER: &str = "TUNESTAT_NO_BROWSER";

/// Returns the default config template with comments.
///
/// Embedded from default_config.toml at compile time.
fn default_config_template() -> &'static str {
    include_str!("../default_config.toml")
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the companion backend (serves `/auth-status`, `/login`, data endpoints).
    pub backend_url: String,
    /// Host of the third-party authentication provider, matched against the referrer.
    pub auth_domain: String,
    /// Upper bound on the session probe, in seconds.
    pub probe_timeout_secs: u64,
    /// Upper bound on a track data request, in seconds. The backend pages
    /// through the whole library before answering.
    pub data_timeout_secs: u64,
    /// Session cookie attached to backend requests (`name=value`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_cookie: Option<String>,
    /// Default tracing filter when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: Self::DEFAULT_BACKEND_URL.to_string(),
            auth_domain: Self::DEFAULT_AUTH_DOMAIN.to_string(),
            probe_timeout_secs: Self::DEFAULT_PROBE_TIMEOUT_SECS,
            data_timeout_secs: Self::DEFAULT_DATA_TIMEOUT_SECS,
            session_cookie: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Config {
    pub const DEFAULT_BACKEND_URL: &'static str = "http://localhost:8000";
    pub const DEFAULT_AUTH_DOMAIN: &'static str = "accounts.spotify.com";
    pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
    pub const DEFAULT_DATA_TIMEOUT_SECS: u64 = 120;

    /// Loads config from the default path and applies environment overrides.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&paths::config_path())?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Loads config from a specific path. A missing file yields defaults.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Applies environment overrides using `lookup` to resolve variables.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
            self.backend_url = url.trim().to_string();
        }
        if let Some(cookie) = lookup(ENV_SESSION_COOKIE).filter(|v| !v.trim().is_empty()) {
            self.session_cookie = Some(cookie.trim().to_string());
        }
    }

    /// Writes the default config template to `path`.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be written.
    pub fn init(path: &Path) -> Result<()> {
        if path.exists() {
            anyhow::bail!("Config file already exists at {}", path.display());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        fs::write(path, default_config_template())
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }

    /// Parsed backend base URL.
    ///
    /// # Errors
    /// Returns an error if `backend_url` is not an absolute http(s) URL.
    pub fn backend(&self) -> Result<Url> {
        let url = Url::parse(&self.backend_url)
            .with_context(|| format!("Invalid backend_url '{}'", self.backend_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            anyhow::bail!("backend_url must use http or https, got '{}'", url.scheme());
        }
        Ok(url)
    }

    /// Resolves a backend endpoint such as `auth-status` or `login`.
    ///
    /// # Errors
    /// Returns an error if the backend URL is invalid.
    pub fn endpoint(&self, name: &str) -> Result<Url> {
        let mut base = self.backend()?;
        // Treat the configured path as a directory so `join` appends instead of replacing.
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        base.join(name)
            .with_context(|| format!("Failed to build endpoint URL for '{name}'"))
    }

    /// Origin that scopes locally persisted values (`scheme://host[:port]`).
    ///
    /// # Errors
    /// Returns an error if the backend URL is invalid.
    pub fn storage_origin(&self) -> Result<String> {
        Ok(self.backend()?.origin().ascii_serialization())
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout_secs.max(1))
    }
}

pub mod paths {
    //! Path resolution for tunestat configuration and data.
    //!
    //! TUNESTAT_HOME resolution order:
    //! 1. TUNESTAT_HOME environment variable (if set)
    //! 2. ~/.config/tunestat (default)

    use std::path::PathBuf;

    /// Returns the tunestat home directory.
    pub fn tunestat_home() -> PathBuf {
        if let Ok(home) = std::env::var("TUNESTAT_HOME") {
            return PathBuf::from(home);
        }

        dirs::home_dir().map_or_else(
            || PathBuf::from(".tunestat"),
            |h| h.join(".config").join("tunestat"),
        )
    }

    /// Returns the path to the config.toml file.
    pub fn config_path() -> PathBuf {
        tunestat_home().join("config.toml")
    }

    /// Returns the path to the per-origin local storage file.
    pub fn local_storage_path() -> PathBuf {
        tunestat_home().join("local_storage.json")
    }

    /// Returns the log directory.
    pub fn logs_dir() -> PathBuf {
        tunestat_home().join("logs")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.probe_timeout(), Duration::from_secs(10));
        assert_eq!(config.data_timeout(), Duration::from_secs(120));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "backend_url = \"https://api.example.com\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.backend_url, "https://api.example.com");
        assert_eq!(config.auth_domain, Config::DEFAULT_AUTH_DOMAIN);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "backend_url = [").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config"));
    }

    #[test]
    fn default_template_parses_to_defaults() {
        let config: Config = toml::from_str(default_config_template()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::init(&path).unwrap();
        assert!(Config::init(&path).is_err());
    }

    #[test]
    fn env_overrides_apply_and_ignore_blank_values() {
        let vars: HashMap<&str, &str> = [
            (ENV_BACKEND_URL, " https://api.example.com "),
            (ENV_SESSION_COOKIE, "  "),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config.apply_overrides(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.backend_url, "https://api.example.com");
        assert_eq!(config.session_cookie, None);
    }

    #[test]
    fn endpoint_appends_to_base_path() {
        let config = Config {
            backend_url: "https://api.example.com/v2".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.endpoint("auth-status").unwrap().as_str(),
            "https://api.example.com/v2/auth-status"
        );

        let root = Config::default();
        assert_eq!(
            root.endpoint("login").unwrap().as_str(),
            "http://localhost:8000/login"
        );
    }

    #[test]
    fn storage_origin_drops_path() {
        let config = Config {
            backend_url: "https://api.example.com:8443/v2".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.storage_origin().unwrap(),
            "https://api.example.com:8443"
        );
    }

    #[test]
    fn non_http_backend_is_rejected() {
        let config = Config {
            backend_url: "ftp://example.com".to_string(),
            ..Config::default()
        };
        assert!(config.backend().is_err());
    }
}

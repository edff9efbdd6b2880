//! Configuration management.
//!
//! Configuration comes from, in increasing precedence:
//!
//! 1. built-in defaults,
//! 2. a TOML file (`--config`, `STOREFRONT_CONFIG_PATH`, or the platform
//!    config directory),
//! 3. environment variables (`STOREFRONT_DATA_DIR`, `STOREFRONT_HOST`,
//!    `STOREFRONT_PORT`), also read from a `.env` file by the binary.
//!
//! ```toml
//! data_dir = "/var/lib/storefront"
//! snapshot_file = "store.json"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [observability.logging]
//! level = "info"
//! format = "json"
//!
//! [observability.metrics]
//! enabled = true
//! port = 9090
//! ```

use crate::storage::DEFAULT_SNAPSHOT_FILE;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default HTTP bind host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default HTTP port.
pub const DEFAULT_PORT: u16 = 8080;

/// Main configuration for storefront.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory holding the snapshot.
    pub data_dir: PathBuf,
    /// Snapshot file name inside `data_dir`.
    pub snapshot_file: String,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Logging and metrics settings, as read from the file.
    pub observability: ObservabilitySettings,
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Observability section of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObservabilitySettings {
    /// Logging settings.
    pub logging: Option<LoggingSettings>,
    /// Metrics settings.
    pub metrics: Option<MetricsSettings>,
}

/// Logging settings from the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingSettings {
    /// Filter directive, e.g. `info` or `storefront=debug,tower_http=warn`.
    pub level: Option<String>,
    /// Output format: `pretty` or `json`.
    pub format: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<String>,
}

/// Metrics settings from the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsSettings {
    /// Whether to expose a Prometheus listener.
    pub enabled: Option<bool>,
    /// Listener port.
    pub port: Option<u16>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Snapshot file name.
    pub snapshot_file: Option<String>,
    /// Server section.
    pub server: Option<ConfigFileServer>,
    /// Observability section.
    pub observability: Option<ObservabilitySettings>,
}

/// Server section in config file.
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFileServer {
    /// Bind host.
    pub host: Option<String>,
    /// Bind port.
    pub port: Option<u16>,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            snapshot_file: DEFAULT_SNAPSHOT_FILE.to_string(),
            server: ServerConfig::default(),
            observability: ObservabilitySettings::default(),
        }
    }
}

/// Platform data directory, falling back to `.storefront` in the working
/// directory.
fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".storefront"),
        |dirs| dirs.data_dir().join("storefront"),
    )
}

impl StorefrontConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration TOML.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Ok(Self::from_config_file(file))
    }

    /// Loads configuration from the default location.
    ///
    /// Checks `<platform config dir>/storefront/config.toml`, then
    /// `~/.config/storefront/config.toml`. Returns the defaults if neither
    /// exists or parses.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("storefront").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("storefront")
                .join("config.toml"),
        ];

        for path in candidates.iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `StorefrontConfig`.
    fn from_config_file(file: ConfigFile) -> Self {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(snapshot_file) = file.snapshot_file.filter(|s| !s.trim().is_empty()) {
            config.snapshot_file = snapshot_file;
        }
        if let Some(server) = file.server {
            if let Some(host) = server.host {
                config.server.host = host;
            }
            if let Some(port) = server.port {
                config.server.port = port;
            }
        }
        if let Some(observability) = file.observability {
            config.observability = observability;
        }

        config
    }

    /// Applies `STOREFRONT_*` environment overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`, which maps variable names
    /// to values.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(data_dir) = lookup("STOREFRONT_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(host) = lookup("STOREFRONT_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("STOREFRONT_PORT") {
            match port.trim().parse() {
                Ok(port) => self.server.port = port,
                Err(_) => tracing::warn!(value = %port, "Ignoring invalid STOREFRONT_PORT"),
            }
        }

        self
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Returns the full snapshot path.
    #[must_use]
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::default();
        assert_eq!(config.snapshot_file, "store.json");
        assert_eq!(config.server, ServerConfig::default());
        assert!(config.snapshot_path().ends_with("store.json"));
    }

    #[test]
    fn test_from_toml() {
        let config = StorefrontConfig::from_toml(
            r#"
            data_dir = "/srv/shop"
            snapshot_file = "tables.json"

            [server]
            port = 9000

            [observability.logging]
            level = "debug"
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/shop"));
        assert_eq!(config.snapshot_path(), PathBuf::from("/srv/shop/tables.json"));
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, 9000);
        let logging = config.observability.logging.unwrap();
        assert_eq!(logging.level.as_deref(), Some("debug"));
        assert_eq!(logging.format.as_deref(), Some("json"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = StorefrontConfig::from_toml("server = 3").unwrap_err();
        assert!(matches!(err, Error::OperationFailed { ref operation, .. } if operation == "parse_config_file"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "snapshot_file = \"x.json\"\n").unwrap();

        let config = StorefrontConfig::load_from_file(&path).unwrap();
        assert_eq!(config.snapshot_file, "x.json");
    }

    #[test]
    fn test_load_from_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(StorefrontConfig::load_from_file(&dir.path().join("nope.toml")).is_err());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("STOREFRONT_DATA_DIR", "/tmp/shop"),
            ("STOREFRONT_HOST", "0.0.0.0"),
            ("STOREFRONT_PORT", "3001"),
        ]
        .into_iter()
        .collect();

        let config = StorefrontConfig::default()
            .with_overrides_from(|key| env.get(key).map(ToString::to_string));

        assert_eq!(config.data_dir, PathBuf::from("/tmp/shop"));
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3001);
    }

    #[test]
    fn test_invalid_port_override_is_ignored() {
        let config = StorefrontConfig::default().with_overrides_from(|key| {
            (key == "STOREFRONT_PORT").then(|| "eighty".to_string())
        });
        assert_eq!(config.server.port, DEFAULT_PORT);
    }
}

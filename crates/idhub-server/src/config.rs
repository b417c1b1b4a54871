//! Service configuration
//!
//! Loaded once at startup and shared read-only behind an `Arc`. Files may be
//! JSON, TOML or YAML; `IDHUB__`-prefixed environment variables override file
//! values, with `__` separating nested keys (`IDHUB__POLL__ATTEMPTS=10`).

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use idhub_auth::{ApiConfig, IssuerConfig};

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "IDHUB";

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    /// Unsupported file format
    #[error("Unsupported configuration file format. Use .toml, .yaml, .yml, or .json")]
    UnsupportedFormat,

    /// Configuration parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] config::ConfigError),

    /// A value is out of range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IdhubConfig {
    /// Remote JWT service endpoints
    pub api: ApiConfig,
    /// Server signing identity
    pub jwt: IssuerConfig,
    /// Ledger database
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Listen address
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Listen port
    #[serde(default = "default_port")]
    pub port: u16,
    /// Token poll budget
    #[serde(default)]
    pub poll: PollConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger database location
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file, or `:memory:`
    #[serde(default = "default_database_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

/// How long a push caller waits for a token to be resolved
#[derive(Debug, Clone, Deserialize)]
pub struct PollConfig {
    /// Ledger reads before giving up
    #[serde(default = "default_poll_attempts")]
    pub attempts: u32,
    /// Sleep between reads, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

impl PollConfig {
    /// Sleep between reads
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            attempts: default_poll_attempts(),
            interval_ms: default_poll_interval_ms(),
        }
    }
}

/// Log output settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub structured: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            structured: false,
        }
    }
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_database_path() -> PathBuf {
    PathBuf::from("idhub.db")
}

fn default_poll_attempts() -> u32 {
    300
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl IdhubConfig {
    /// Configuration with every optional section at its default
    pub fn new(api: ApiConfig, jwt: IssuerConfig) -> Self {
        Self {
            api,
            jwt,
            database: DatabaseConfig::default(),
            bind_address: default_bind_address(),
            port: default_port(),
            poll: PollConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a file (TOML, YAML, or JSON)
    ///
    /// The file format is auto-detected from the file extension. Environment
    /// variables with the `IDHUB__` prefix override file settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file doesn't exist
    /// - The file format is unsupported
    /// - The file contains invalid configuration
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        use config::{Config, File, FileFormat};

        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let format = match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => FileFormat::Toml,
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => return Err(ConfigError::UnsupportedFormat),
        };

        let config = Config::builder()
            .add_source(File::new(
                path.to_str().ok_or(ConfigError::UnsupportedFormat)?,
                format,
            ))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values the service cannot run with
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll.attempts == 0 {
            return Err(ConfigError::Invalid("poll.attempts must be at least 1".into()));
        }
        if self.jwt.lifetime_secs <= 0 {
            return Err(ConfigError::Invalid("jwt.lifetime_secs must be positive".into()));
        }
        for (key, url) in [
            ("api.decode_jwt", &self.api.decode_jwt),
            ("api.verify_jwt", &self.api.verify_jwt),
            ("api.encode_jwt", &self.api.encode_jwt),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{key} is empty")));
            }
        }
        Ok(())
    }

    /// Address to bind the listener to
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `bind_address` is not an IP address.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_address, self.port)
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("bind_address: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "api": {
            "decode_jwt": "http://jwt.local/decode",
            "verify_jwt": "http://jwt.local/verify",
            "encode_jwt": "http://jwt.local/encode"
        },
        "jwt": {
            "server_private_key": "server-private",
            "server_public_key": "server-public"
        }
    }"#;

    fn write_config(name: &str, body: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(body.as_bytes())
            .unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults_from_minimal_json() {
        let (_dir, path) = write_config("cfg.json", MINIMAL);
        let config = IdhubConfig::from_file(&path).unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.bind_address, "0.0.0.0");
        assert_eq!(config.poll.attempts, 300);
        assert_eq!(config.poll.interval(), Duration::from_secs(1));
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.structured);
        assert_eq!(config.jwt.lifetime_secs, 300);
        assert_eq!(config.api.timeout_secs, 10);
        assert_eq!(config.database.path, PathBuf::from("idhub.db"));
    }

    #[test]
    fn test_toml_file() {
        let (_dir, path) = write_config(
            "cfg.toml",
            r#"
            port = 9000

            [api]
            decode_jwt = "http://jwt/decode"
            verify_jwt = "http://jwt/verify"
            encode_jwt = "http://jwt/encode"

            [jwt]
            server_private_key = "k"
            server_public_key = "p"
            issuer = "custom.issuer"

            [poll]
            attempts = 5
            interval_ms = 10
            "#,
        );
        let config = IdhubConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.jwt.issuer, "custom.issuer");
        assert_eq!(config.poll.attempts, 5);
        assert_eq!(config.poll.interval(), Duration::from_millis(10));
    }

    #[test]
    fn test_missing_file() {
        let err = IdhubConfig::from_file("/nonexistent/cfg.json").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_unsupported_extension() {
        let (_dir, path) = write_config("cfg.ini", MINIMAL);
        assert!(matches!(
            IdhubConfig::from_file(&path),
            Err(ConfigError::UnsupportedFormat)
        ));
    }

    #[test]
    fn test_missing_api_section_fails() {
        let (_dir, path) = write_config("cfg.json", r#"{"port": 1}"#);
        assert!(matches!(
            IdhubConfig::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_zero_poll_attempts_rejected() {
        let (_dir, path) = write_config(
            "cfg.json",
            &MINIMAL.replacen('{', r#"{"poll": {"attempts": 0},"#, 1),
        );
        assert!(matches!(
            IdhubConfig::from_file(&path),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_socket_addr() {
        let (_dir, path) = write_config("cfg.json", MINIMAL);
        let mut config = IdhubConfig::from_file(&path).unwrap();
        assert_eq!(config.socket_addr().unwrap().port(), 8080);
        config.bind_address = "not an ip".into();
        assert!(config.socket_addr().is_err());
    }
}

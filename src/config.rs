//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.
//!
//! The record store URL and anonymous key have no defaults; a process that
//! cannot find both stops at startup with a diagnostic naming what is missing.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::store::{SessionStore, SupabaseConfig};

/// Environment variable holding the project URL
pub const URL_VAR: &str = "SUPABASE_URL";
/// Environment variable holding the anonymous API key
pub const ANON_KEY_VAR: &str = "SUPABASE_ANON_KEY";

/// Names accepted for each required setting, first match wins
const URL_VARS: [&str; 2] = [URL_VAR, "VITE_SUPABASE_URL"];
const ANON_KEY_VARS: [&str; 2] = [ANON_KEY_VAR, "VITE_SUPABASE_ANON_KEY"];

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Hosted record store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub anon_key: Option<String>,

    #[serde(default = "default_table")]
    pub table: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_table() -> String {
    crate::loads::LOADS_TABLE.to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: None,
            anon_key: None,
            table: default_table(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Dashboard server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8085
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Session persistence configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_persist")]
    pub persist: bool,

    pub file: Option<PathBuf>,
}

fn default_persist() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            persist: default_persist(),
            file: None,
        }
    }
}

impl SessionConfig {
    /// Session file to use, if persistence is on
    pub fn store(&self) -> Option<SessionStore> {
        if !self.persist {
            return None;
        }
        let path = self.file.clone().unwrap_or_else(SessionStore::default_path);
        Some(SessionStore::new(path))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LoggingConfig {
    /// Install the global tracing subscriber
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    pub fn init(&self) {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("ratecon={},tower_http={}", self.level, self.level).into()
        });

        let registry = tracing_subscriber::registry().with(filter);
        let result = if self.format == "json" {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
        } else {
            registry.with(tracing_subscriber::fmt::layer()).try_init()
        };

        if let Err(e) = result {
            eprintln!("Logging already initialized: {}", e);
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::parse(path, &content)
    }

    fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("ratecon").join("config.toml")),
            Some(PathBuf::from("/etc/ratecon/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                match Self::load_with_env(path) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply overrides from `lookup` (the process environment in production)
    fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| lookup(k))
                .find(|v| !v.trim().is_empty())
        };

        // Store overrides
        if let Some(url) = first(&URL_VARS) {
            self.store.url = Some(url);
        }
        if let Some(key) = first(&ANON_KEY_VARS) {
            self.store.anon_key = Some(key);
        }
        if let Some(table) = lookup("RATECON_TABLE") {
            self.store.table = table;
        }

        // Server overrides
        if let Some(host) = lookup("RATECON_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("RATECON_PORT") {
            match port.parse() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!("Ignoring invalid RATECON_PORT value: {}", port),
            }
        }

        // Session overrides
        if let Some(file) = lookup("RATECON_SESSION_FILE") {
            self.session.file = Some(PathBuf::from(file));
        }

        // Logging overrides
        if let Some(level) = lookup("RATECON_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("RATECON_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// The record store settings, or every missing required setting
    pub fn supabase(&self) -> Result<SupabaseConfig, ConfigError> {
        let present = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let url = present(&self.store.url);
        let anon_key = present(&self.store.anon_key);

        match (url, anon_key) {
            (Some(url), Some(anon_key)) => Ok(SupabaseConfig {
                url,
                anon_key,
                request_timeout_ms: self.store.request_timeout_secs.saturating_mul(1000),
            }),
            (url, anon_key) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(URL_VAR.to_string());
                }
                if anon_key.is_none() {
                    missing.push(ANON_KEY_VAR.to_string());
                }
                Err(ConfigError::MissingSettings { missing })
            }
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error(
        "CRITICAL ERROR: Missing API Keys!\n\nSet them in the environment or in the [store] section of config.toml.\n\nMissing: {}",
        .missing.join(", ")
    )]
    MissingSettings { missing: Vec<String> },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# RateCon Configuration
#
# Environment variables override these settings:
# - SUPABASE_URL (or VITE_SUPABASE_URL)
# - SUPABASE_ANON_KEY (or VITE_SUPABASE_ANON_KEY)
# - RATECON_TABLE
# - RATECON_HOST
# - RATECON_PORT
# - RATECON_SESSION_FILE
# - RATECON_LOG_LEVEL
# - RATECON_LOG_FORMAT

[store]
# Supabase project URL (required)
# url = "https://your-project.supabase.co"

# Public anonymous API key (required)
# anon_key = ""

# Table holding the loads
table = "loads"

# Request timeout in seconds
request_timeout_secs = 30

[server]
# Dashboard server host
host = "127.0.0.1"

# Dashboard server port
port = 8085

[session]
# Keep the signed-in session between runs
persist = true

# Session file (default: <data dir>/ratecon/session.json)
# file = "/home/me/.local/share/ratecon/session.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_default_template_parses() {
        let config = Config::parse(Path::new("default.toml"), &generate_default_config()).unwrap();
        assert_eq!(config.store.table, "loads");
        assert_eq!(config.server.port, 8085);
        assert!(config.session.persist);
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_missing_both_settings() {
        let err = Config::default().supabase().unwrap_err();
        match &err {
            ConfigError::MissingSettings { missing } => {
                assert_eq!(missing, &vec!["SUPABASE_URL", "SUPABASE_ANON_KEY"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err
            .to_string()
            .ends_with("Missing: SUPABASE_URL, SUPABASE_ANON_KEY"));
    }

    #[test]
    fn test_missing_one_setting() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[("SUPABASE_URL", "https://x.supabase.co")]));

        let err = config.supabase().unwrap_err();
        assert!(err.to_string().ends_with("Missing: SUPABASE_ANON_KEY"));
    }

    #[test]
    fn test_blank_values_count_as_missing() {
        let mut config = Config::default();
        config.store.url = Some("   ".into());
        config.store.anon_key = Some("key".into());

        assert!(matches!(
            config.supabase(),
            Err(ConfigError::MissingSettings { missing }) if missing == vec!["SUPABASE_URL"]
        ));
    }

    #[test]
    fn test_vite_fallback_names() {
        let mut config = Config::default();
        config.apply_env_overrides(env(&[
            ("VITE_SUPABASE_URL", "https://vite.supabase.co"),
            ("VITE_SUPABASE_ANON_KEY", "vite-key"),
            ("SUPABASE_ANON_KEY", "plain-key"),
        ]));

        let store = config.supabase().unwrap();
        assert_eq!(store.url, "https://vite.supabase.co");
        assert_eq!(store.anon_key, "plain-key");
        assert_eq!(store.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_huge_timeout_saturates() {
        let mut config = Config::default();
        config.store.url = Some("https://x.supabase.co".into());
        config.store.anon_key = Some("key".into());
        config.store.request_timeout_secs = u64::MAX;

        assert_eq!(config.supabase().unwrap().request_timeout_ms, u64::MAX);
    }

    #[test]
    fn test_env_overrides_file() {
        let mut config = Config::parse(
            Path::new("c.toml"),
            r#"
            [store]
            url = "https://file.supabase.co"
            anon_key = "file-key"

            [server]
            port = 9000
            "#,
        )
        .unwrap();

        config.apply_env_overrides(env(&[
            ("SUPABASE_URL", "https://env.supabase.co"),
            ("RATECON_PORT", "not-a-port"),
            ("RATECON_LOG_FORMAT", "json"),
        ]));

        assert_eq!(config.supabase().unwrap().url, "https://env.supabase.co");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_session_store_toggle() {
        let mut config = SessionConfig::default();
        config.file = Some(PathBuf::from("/tmp/s.json"));
        assert_eq!(
            config.store().unwrap().path(),
            Path::new("/tmp/s.json")
        );

        config.persist = false;
        assert!(config.store().is_none());
    }

    #[test]
    fn test_parse_error() {
        let err = Config::parse(Path::new("bad.toml"), "[server]\nport = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}

//! Client configuration loading
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file (`<config dir>/jukeq/config.toml`)
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable config file never prevents startup; it is
//! logged and the defaults apply.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::warn;

/// Default server base URL when nothing else is configured.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Environment variable overriding the server base URL.
pub const SERVER_URL_ENV: &str = "JUKEQ_SERVER_URL";

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct UiConfig {
    /// Base URL of the music-queue server (scheme + host + port).
    pub server_url: String,
    /// Default tracing filter directive when RUST_LOG is unset.
    pub log_level: String,
    /// Log destination; stderr is unusable while the terminal is in raw
    /// mode, so logs go to a file.
    pub log_file: Option<PathBuf>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            log_level: "jukeq_ui=info,jukeq_common=info".to_string(),
            log_file: None,
        }
    }
}

/// On-disk configuration file schema. All fields optional; absent fields
/// fall through to the compiled defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub server_url: Option<String>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl UiConfig {
    /// Resolve configuration from all sources. `cli_server` is the value
    /// of the `--server` argument, if given.
    pub fn resolve(cli_server: Option<&str>) -> Self {
        let env_server = std::env::var(SERVER_URL_ENV).ok();
        let toml = load_config_file();
        Self::from_sources(cli_server, env_server.as_deref(), toml)
    }

    /// Pure merge of the three override layers over the defaults.
    fn from_sources(
        cli_server: Option<&str>,
        env_server: Option<&str>,
        toml: Option<TomlConfig>,
    ) -> Self {
        let mut config = Self::default();

        if let Some(toml) = toml {
            if let Some(url) = toml.server_url {
                config.server_url = url;
            }
            if let Some(level) = toml.log_level {
                config.log_level = level;
            }
            if toml.log_file.is_some() {
                config.log_file = toml.log_file;
            }
        }

        if let Some(url) = env_server {
            config.server_url = url.to_string();
        }
        if let Some(url) = cli_server {
            config.server_url = url.to_string();
        }

        // Trailing slashes make URL joining ambiguous; normalize here once.
        while config.server_url.ends_with('/') {
            config.server_url.pop();
        }

        config
    }
}

/// Default configuration file path for the platform.
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("jukeq").join("config.toml"))
}

/// Load and parse the config file, if present. Parse failures are
/// reported and treated as "no config file".
fn load_config_file() -> Option<TomlConfig> {
    let path = config_file_path()?;
    let content = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!("Ignoring malformed config file {}: {}", path.display(), e);
            None
        }
    }
}

/// Parse a TOML string into the config file schema.
///
/// Exposed for tests and for future `--config <path>` support.
pub fn parse_toml_config(content: &str) -> crate::Result<TomlConfig> {
    toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults_when_no_sources() {
        let config = UiConfig::from_sources(None, None, None);
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let toml = parse_toml_config(
            r#"
            server_url = "http://music.local:9090"
            log_level = "debug"
            log_file = "/tmp/jukeq.log"
            "#,
        )
        .unwrap();

        let config = UiConfig::from_sources(None, None, Some(toml));
        assert_eq!(config.server_url, "http://music.local:9090");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/jukeq.log")));
    }

    #[test]
    fn test_env_overrides_toml() {
        let toml = parse_toml_config(r#"server_url = "http://from-toml:1""#).unwrap();
        let config = UiConfig::from_sources(None, Some("http://from-env:2"), Some(toml));
        assert_eq!(config.server_url, "http://from-env:2");
    }

    #[test]
    fn test_cli_overrides_everything() {
        let toml = parse_toml_config(r#"server_url = "http://from-toml:1""#).unwrap();
        let config = UiConfig::from_sources(
            Some("http://from-cli:3"),
            Some("http://from-env:2"),
            Some(toml),
        );
        assert_eq!(config.server_url, "http://from-cli:3");
    }

    #[test]
    fn test_trailing_slash_normalized() {
        let config = UiConfig::from_sources(Some("http://host:8080/"), None, None);
        assert_eq!(config.server_url, "http://host:8080");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml = parse_toml_config(r#"log_level = "trace""#).unwrap();
        let config = UiConfig::from_sources(None, None, Some(toml));
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.log_level, "trace");
    }

    #[test]
    fn test_malformed_toml_is_an_error() {
        assert!(parse_toml_config("server_url = [not a string").is_err());
    }

    #[test]
    fn test_config_file_roundtrip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server_url = \"http://disk-host:5555\"\n").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let toml = parse_toml_config(&content).unwrap();
        let config = UiConfig::from_sources(None, None, Some(toml));
        assert_eq!(config.server_url, "http://disk-host:5555");
    }

    #[test]
    #[serial]
    fn test_resolve_reads_env_var() {
        std::env::set_var(SERVER_URL_ENV, "http://env-host:7777");
        let config = UiConfig::resolve(None);
        assert_eq!(config.server_url, "http://env-host:7777");
        std::env::remove_var(SERVER_URL_ENV);
    }

    #[test]
    #[serial]
    fn test_resolve_cli_beats_env() {
        std::env::set_var(SERVER_URL_ENV, "http://env-host:7777");
        let config = UiConfig::resolve(Some("http://cli-host:8888"));
        assert_eq!(config.server_url, "http://cli-host:8888");
        std::env::remove_var(SERVER_URL_ENV);
    }
}

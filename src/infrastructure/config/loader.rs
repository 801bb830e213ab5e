use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Config file read when no `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "taskchat.yaml";

/// Prefix for environment overrides; nested keys are split on `__`.
pub const ENV_PREFIX: &str = "TASKCHAT_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("auth.jwt_secret must be set (e.g. TASKCHAT_AUTH__JWT_SECRET)")]
    MissingJwtSecret,

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid port: {0}")]
    InvalidPort(u16),

    #[error("Invalid chat.{0}: must be at least 1")]
    InvalidChatLimit(&'static str),

    #[error("Invalid requests_per_second: {0}. Must be at least 1")]
    InvalidRateLimit(u32),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must not exceed max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. `taskchat.yaml`, or the file passed explicitly
    /// 3. Environment variables (`TASKCHAT_*` prefix, highest priority)
    ///
    /// An explicitly passed file must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let yaml = match path {
            Some(path) => {
                anyhow::ensure!(path.exists(), "Config file not found: {}", path.display());
                Yaml::file(path)
            }
            None => Yaml::file(DEFAULT_CONFIG_FILE),
        };

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(yaml)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, without environment overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingJwtSecret);
        }

        if config.server.port == 0 {
            return Err(ConfigError::InvalidPort(config.server.port));
        }

        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }

        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        if config.chat.history_limit == 0 {
            return Err(ConfigError::InvalidChatLimit("history_limit"));
        }
        if config.chat.max_tool_iterations == 0 {
            return Err(ConfigError::InvalidChatLimit("max_tool_iterations"));
        }
        if config.chat.max_message_chars == 0 {
            return Err(ConfigError::InvalidChatLimit("max_message_chars"));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if config.completion.requests_per_second == 0 {
            return Err(ConfigError::InvalidRateLimit(config.completion.requests_per_second));
        }

        if config.completion.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("completion.model cannot be empty".to_string()));
        }

        if config.retry.initial_backoff_ms > config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::logging::LogFormat;
    use std::io::Write;

    fn valid_config() -> Config {
        Config {
            auth: crate::domain::models::AuthConfig {
                jwt_secret: "test-secret".to_string(),
                ..Default::default()
            },
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.database.path, ".taskchat/taskchat.db");
        assert_eq!(config.chat.history_limit, 10);
        assert_eq!(config.chat.max_tool_iterations, 5);
        assert_eq!(config.logging.level, "info");

        // No secret by default
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::MissingJwtSecret)));
        ConfigLoader::validate(&valid_config()).expect("Config with a secret should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
server:
  host: 0.0.0.0
  port: 9000
auth:
  jwt_secret: from-yaml
chat:
  history_limit: 20
database:
  path: /custom/path.db
logging:
  level: debug
  format: pretty
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.chat.history_limit, 20);
        assert_eq!(config.chat.max_tool_iterations, 5);
        assert_eq!(config.database.path, "/custom/path.db");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.logging.format, LogFormat::Pretty);

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            chat: crate::domain::models::ChatConfig {
                max_tool_iterations: 0,
                ..Default::default()
            },
            ..valid_config()
        };
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidChatLimit("max_tool_iterations"))
        ));

        let mut config = valid_config();
        config.logging.level = "loud".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidLogLevel(_))));

        let mut config = valid_config();
        config.retry.initial_backoff_ms = 10_000;
        config.retry.max_backoff_ms = 100;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidBackoff(10_000, 100))));

        let mut config = valid_config();
        config.database.path = "  ".to_string();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::EmptyDatabasePath)));
    }

    #[test]
    fn test_load_from_file_and_env_override() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "auth:\n  jwt_secret: file-secret\nserver:\n  port: 7000\nchat:\n  history_limit: 4"
        )
        .unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.server.port, 7000);
        assert_eq!(config.auth.jwt_secret, "file-secret");

        temp_env::with_vars(
            [
                ("TASKCHAT_SERVER__PORT", Some("7100")),
                ("TASKCHAT_CHAT__HISTORY_LIMIT", Some("6")),
            ],
            || {
                let config = ConfigLoader::load(Some(file.path())).unwrap();
                assert_eq!(config.server.port, 7100);
                assert_eq!(config.chat.history_limit, 6);
                assert_eq!(config.auth.jwt_secret, "file-secret");
            },
        );
    }

    #[test]
    fn test_env_only_config() {
        temp_env::with_vars(
            [
                ("TASKCHAT_AUTH__JWT_SECRET", Some("env-secret")),
                ("TASKCHAT_DATABASE__PATH", Some("/tmp/env.db")),
            ],
            || {
                let dir = tempfile::tempdir().unwrap();
                let missing = dir.path().join("absent.yaml");
                assert!(ConfigLoader::load(Some(&missing)).is_err());

                let empty = dir.path().join("empty.yaml");
                std::fs::write(&empty, "{}").unwrap();
                let config = ConfigLoader::load(Some(&empty)).unwrap();
                assert_eq!(config.auth.jwt_secret, "env-secret");
                assert_eq!(config.database.url(), "sqlite:/tmp/env.db");
            },
        );
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let mut config = valid_config();
        config.completion.api_key = Some("sk-ant-secret".to_string());

        let shown = serde_yaml::to_string(&config.redacted()).unwrap();
        assert!(!shown.contains("test-secret"));
        assert!(!shown.contains("sk-ant-secret"));
    }
}

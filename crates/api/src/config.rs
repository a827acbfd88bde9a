//! Server configuration.
//!
//! Layered with figment: built-in defaults, then an optional `firefleet.toml`
//! in the working directory, then `FIREFLEET_*` environment variables.

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use firefleet_observability::LogFormat;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "firefleet.toml";

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "FIREFLEET_";

const DEV_JWT_SECRET: &str = "firefleet-dev-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Socket address the HTTP server binds to.
    pub bind_addr: String,
    /// HS256 signing secret. A development default is used when unset.
    pub jwt_secret: Option<String>,
    pub jwt_ttl_hours: i64,
    /// Comma-separated allowed origins, or `*`.
    pub cors_origins: String,
    /// Postgres connection string. When unset, data lives in memory.
    pub database_url: Option<String>,
    /// Code that must accompany a manager registration. Unset disables
    /// manager self-registration.
    pub manager_registration_code: Option<String>,
    /// Wipe and load the demo fleet on startup.
    pub seed_on_start: bool,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8001".to_string(),
            jwt_secret: None,
            jwt_ttl_hours: firefleet_auth::jwt::DEFAULT_TTL_HOURS,
            cors_origins: "*".to_string(),
            database_url: None,
            manager_registration_code: None,
            seed_on_start: false,
            log_format: LogFormat::Json,
        }
    }
}

impl Config {
    /// Load from `firefleet.toml` (if present) and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    pub fn load_from(config_file: &Path) -> Result<Self, ConfigError> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("jwt_ttl_hours must be positive".into()));
        }
        if self.bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_addr must not be empty".into()));
        }
        Ok(())
    }

    /// The configured secret, or an insecure development default (logged).
    pub fn jwt_secret_or_default(&self) -> String {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                tracing::warn!("FIREFLEET_JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        }
    }

    /// Parsed CORS origins; `None` means any origin.
    pub fn cors_origin_list(&self) -> Option<Vec<String>> {
        let origins: Vec<String> = self
            .cors_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            None
        } else {
            Some(origins)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.jwt_ttl_hours, 24);
        assert_eq!(config.cors_origin_list(), None);
    }

    #[test]
    fn env_overrides_file_and_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                CONFIG_FILE_NAME,
                r#"
                bind_addr = "127.0.0.1:9000"
                cors_origins = "http://localhost:3000"
                "#,
            )?;
            jail.set_env("FIREFLEET_BIND_ADDR", "127.0.0.1:9100");
            jail.set_env("FIREFLEET_MANAGER_REGISTRATION_CODE", "amir-kodu");
            jail.set_env("FIREFLEET_LOG_FORMAT", "pretty");

            let config = Config::load().map_err(|e| e.to_string())?;
            assert_eq!(config.bind_addr, "127.0.0.1:9100");
            assert_eq!(config.manager_registration_code.as_deref(), Some("amir-kodu"));
            assert_eq!(config.log_format, LogFormat::Pretty);
            assert_eq!(
                config.cors_origin_list(),
                Some(vec!["http://localhost:3000".to_string()])
            );
            Ok(())
        });
    }

    #[test]
    fn non_positive_ttl_is_rejected() {
        let config = Config {
            jwt_ttl_hours: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn load_validates_what_it_extracts() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("FIREFLEET_JWT_TTL_HOURS", "-1");
            assert!(matches!(Config::load(), Err(ConfigError::Invalid(_))));
            Ok(())
        });
    }
}

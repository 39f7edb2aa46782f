//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use assessment_core::{SessionLimits, SessionScope};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub language_model: String,
    pub passage_model: String,
    pub session_scope: SessionScope,
    pub session_limits: SessionLimits,
    pub allowed_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // --- Server Settings ---
        let bind_address_str =
            lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- API Key (optional here, required by the binary) ---
        let openai_api_key = lookup("OPENAI_API_KEY").filter(|key| !key.trim().is_empty());

        // --- Adapter-specific Settings ---
        let language_model =
            lookup("LANGUAGE_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());
        let passage_model =
            lookup("PASSAGE_MODEL").unwrap_or_else(|| "gpt-4o-mini".to_string());

        // --- Cache Settings ---
        let session_scope = match lookup("SESSION_SCOPE") {
            Some(raw) => raw.parse::<SessionScope>().map_err(|e| {
                ConfigError::InvalidValue("SESSION_SCOPE".to_string(), e.to_string())
            })?,
            None => SessionScope::Attempt,
        };

        let defaults = SessionLimits::default();
        let idle_ttl = match lookup("SESSION_IDLE_TTL_SECS") {
            Some(raw) => Duration::from_secs(parse_positive("SESSION_IDLE_TTL_SECS", &raw)? as u64),
            None => defaults.idle_ttl,
        };
        let max_attempts = match lookup("MAX_ATTEMPT_SESSIONS") {
            Some(raw) => parse_positive("MAX_ATTEMPT_SESSIONS", &raw)?,
            None => defaults.max_attempts,
        };
        let session_limits = SessionLimits {
            idle_ttl,
            max_attempts,
        };

        let allowed_origin =
            lookup("ALLOWED_ORIGIN").unwrap_or_else(|| "http://localhost:5173".to_string());

        Ok(Self {
            bind_address,
            log_level,
            openai_api_key,
            language_model,
            passage_model,
            session_scope,
            session_limits,
            allowed_origin,
        })
    }

    /// The API key, or the error the binary reports when it is absent.
    pub fn require_openai_api_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))
    }
}

fn parse_positive(var: &str, raw: &str) -> Result<usize, ConfigError> {
    raw.trim()
        .parse::<usize>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| {
            ConfigError::InvalidValue(var.to_string(), format!("'{}' is not a positive integer", raw))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.session_scope, SessionScope::Attempt);
        assert_eq!(config.passage_model, "gpt-4o-mini");
        assert_eq!(config.session_limits, SessionLimits::default());
        assert!(config.openai_api_key.is_none());
        assert!(matches!(
            config.require_openai_api_key(),
            Err(ConfigError::MissingVar(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("BIND_ADDRESS", "127.0.0.1:8080"),
            ("RUST_LOG", "debug"),
            ("OPENAI_API_KEY", "sk-test"),
            ("SESSION_SCOPE", "application"),
            ("PASSAGE_MODEL", "gpt-4o"),
            ("SESSION_IDLE_TTL_SECS", "90"),
            ("MAX_ATTEMPT_SESSIONS", "16"),
        ])
        .unwrap();
        assert_eq!(config.bind_address.port(), 8080);
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.require_openai_api_key().unwrap(), "sk-test");
        assert_eq!(config.session_scope, SessionScope::Application);
        assert_eq!(config.passage_model, "gpt-4o");
        assert_eq!(config.session_limits.idle_ttl, Duration::from_secs(90));
        assert_eq!(config.session_limits.max_attempts, 16);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = load(&[("SESSION_SCOPE", "forever")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "SESSION_SCOPE"));

        let err = load(&[("BIND_ADDRESS", "not-an-address")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "BIND_ADDRESS"));

        let err = load(&[("MAX_ATTEMPT_SESSIONS", "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "MAX_ATTEMPT_SESSIONS"));

        let err = load(&[("RUST_LOG", "chatty")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref var, _) if var == "RUST_LOG"));
    }
}

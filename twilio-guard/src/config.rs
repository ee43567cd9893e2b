//! Configuration module for environment variable parsing.
//!
//! The guard never looks configuration up on its own: a [`GuardConfig`] is
//! built once at startup and handed to [`crate::web::twilio_view`].

use std::{env, str::FromStr};

use thiserror::Error;
use tracing::warn;

/// Default upper bound on a buffered webhook body (64 KiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

/// Guard configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GuardConfig {
    /// Twilio auth token, the shared secret for signature verification
    pub auth_token: Option<String>,

    /// Skip signature validation entirely (tests and local development)
    pub skip_signature_validation: bool,

    /// Log signature mismatches instead of rejecting the request
    pub debug: bool,

    /// Scheme used when the URL is rebuilt from the `Host` header
    pub local_scheme: String,

    /// Maximum number of body bytes buffered for validation
    pub max_body_bytes: usize,

    /// Port for the demo web server to listen on
    pub port: u16,
}

impl Default for GuardConfig {
    fn default() -> Self {
        GuardConfig {
            auth_token: None,
            skip_signature_validation: false,
            debug: false,
            local_scheme: "http".to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            port: 8080,
        }
    }
}

/// Startup configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TWILIO_AUTH_TOKEN must be set unless TWILIO_SKIP_SIGNATURE_VALIDATION is enabled")]
    MissingAuthToken,

    #[error("unsupported local scheme '{0}', expected http or https")]
    InvalidLocalScheme(String),
}

impl GuardConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = GuardConfig::default();

        GuardConfig {
            auth_token: env::var("TWILIO_AUTH_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty()),

            skip_signature_validation: parse_bool(
                "TWILIO_SKIP_SIGNATURE_VALIDATION",
                defaults.skip_signature_validation,
            ),

            debug: parse_bool("SMS_DEBUG", defaults.debug),

            local_scheme: env::var("TWILIO_LOCAL_SCHEME")
                .map(|s| s.trim().to_ascii_lowercase())
                .unwrap_or(defaults.local_scheme),

            max_body_bytes: parse_num("TWILIO_MAX_BODY_BYTES", defaults.max_body_bytes),

            port: parse_num("PORT", defaults.port),
        }
    }

    /// Config with a known auth token and every other option at its default.
    pub fn with_auth_token(token: impl Into<String>) -> Self {
        GuardConfig {
            auth_token: Some(token.into()),
            ..GuardConfig::default()
        }
    }

    /// Check the options that must hold before serving traffic.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.skip_signature_validation && self.auth_token.is_none() {
            return Err(ConfigError::MissingAuthToken);
        }
        if self.local_scheme != "http" && self.local_scheme != "https" {
            return Err(ConfigError::InvalidLocalScheme(self.local_scheme.clone()));
        }
        Ok(())
    }
}

/// Parse a numeric value, warning and falling back to `default` when invalid.
fn parse_num<T: FromStr + Copy>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid numeric value, using default");
            default
        }
    }
}

/// Parse a boolean flag like "true", "1", "yes" or "off".
fn parse_bool(name: &str, default: bool) -> bool {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" | "" => false,
        _ => {
            warn!(env_var = name, value = %raw, "Invalid boolean value, using default");
            default
        }
    }
}

//! Environment-driven configuration for token issuance and the reference gateway.

use crate::crypto::JsonWebKey;
use common::secret::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default token lifetime in seconds (1 hour).
pub const DEFAULT_TOKEN_LIFETIME_SECONDS: u64 = 3600;

/// Upper bound for `AUTH_TOKEN_LIFETIME_SECONDS` (24 hours).
pub const MAX_TOKEN_LIFETIME_SECONDS: u64 = 86_400;

/// Default gateway request timeout in seconds.
pub const DEFAULT_GATEWAY_TIMEOUT_SECONDS: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signing key configuration: {0}")]
    InvalidSigningKey(String),

    #[error("Invalid token lifetime configuration: {0}")]
    InvalidTokenLifetime(String),

    #[error("Invalid gateway configuration: {0}")]
    InvalidGateway(String),
}

/// Token issuance settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Signing key. Its `Debug` output redacts private members.
    pub signing_jwk: JsonWebKey,
    pub issuer: String,
    pub audience: String,
    pub token_lifetime: Duration,
}

impl AuthConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// See [`AuthConfig::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, the JWK is not
    /// valid JSON, or the lifetime is not an integer in `1..=86400`.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let jwk_json = required(vars, "AUTH_SIGNING_JWK")?;
        // Position only: the serde message can quote member values
        let signing_jwk = JsonWebKey::from_json(jwk_json).map_err(|e| {
            ConfigError::InvalidSigningKey(format!(
                "AUTH_SIGNING_JWK is not a valid JWK (line {}, column {})",
                e.line(),
                e.column()
            ))
        })?;

        let issuer = required(vars, "AUTH_ISSUER")?.to_string();
        let audience = required(vars, "AUTH_AUDIENCE")?.to_string();

        let lifetime_seconds = if let Some(value_str) = vars.get("AUTH_TOKEN_LIFETIME_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidTokenLifetime(format!(
                    "AUTH_TOKEN_LIFETIME_SECONDS must be a valid integer, got '{value_str}': {e}"
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidTokenLifetime(
                    "AUTH_TOKEN_LIFETIME_SECONDS must be positive".to_string(),
                ));
            }

            if value > MAX_TOKEN_LIFETIME_SECONDS {
                return Err(ConfigError::InvalidTokenLifetime(format!(
                    "AUTH_TOKEN_LIFETIME_SECONDS must not exceed {MAX_TOKEN_LIFETIME_SECONDS} seconds, got {value}"
                )));
            }

            value
        } else {
            DEFAULT_TOKEN_LIFETIME_SECONDS
        };

        Ok(AuthConfig {
            signing_jwk,
            issuer,
            audience,
            token_lifetime: Duration::from_secs(lifetime_seconds),
        })
    }
}

/// Settings for the client-credentials gateway.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL of the token authority, without the `/oauth/token` path.
    pub url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub timeout: Duration,
}

impl GatewayConfig {
    /// Create a configuration with the default timeout.
    #[must_use]
    pub fn new(url: impl Into<String>, client_id: impl Into<String>, client_secret: SecretString) -> Self {
        Self {
            url: url.into(),
            client_id: client_id.into(),
            client_secret,
            timeout: Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECONDS),
        }
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// See [`GatewayConfig::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, the URL is not
    /// http(s), or the timeout is not a positive integer.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let url = required(vars, "AUTH_GATEWAY_URL")?;
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidGateway(format!(
                "AUTH_GATEWAY_URL must be an http(s) URL, got '{url}'"
            )));
        }
        let url = url.trim_end_matches('/').to_string();

        let client_id = required(vars, "AUTH_CLIENT_ID")?.to_string();
        let client_secret = SecretString::from(required(vars, "AUTH_CLIENT_SECRET")?.to_string());

        let timeout_seconds = if let Some(value_str) = vars.get("AUTH_GATEWAY_TIMEOUT_SECONDS") {
            let value: u64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidGateway(format!(
                    "AUTH_GATEWAY_TIMEOUT_SECONDS must be a valid integer, got '{value_str}': {e}"
                ))
            })?;
            if value == 0 {
                return Err(ConfigError::InvalidGateway(
                    "AUTH_GATEWAY_TIMEOUT_SECONDS must be positive".to_string(),
                ));
            }
            value
        } else {
            DEFAULT_GATEWAY_TIMEOUT_SECONDS
        };

        Ok(Self::new(url, client_id, client_secret).with_timeout(Duration::from_secs(timeout_seconds)))
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

fn required<'a>(vars: &'a HashMap<String, String>, name: &str) -> Result<&'a str, ConfigError> {
    vars.get(name)
        .map(String::as_str)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

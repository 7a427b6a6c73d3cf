//! OAuth 2.0 client-credentials [`SecurityGateway`] over HTTP.
//!
//! POSTs a `client_credentials` form to `<url>/oauth/token` and maps the
//! response:
//!
//! - 2xx with `{access_token, token_type, expires_in}` - success
//! - 400 / 401 - [`GatewayError::Rejected`]
//! - 5xx, other statuses, transport failures - [`GatewayError::Http`]
//! - unparsable 2xx body - [`GatewayError::InvalidResponse`]
//!
//! # Security
//!
//! - Client secret is stored as `SecretString` (never logged)
//! - Error response bodies are logged at trace level only
//! - HTTP timeouts prevent hanging connections

use crate::config::GatewayConfig;
use crate::context::gateway::{GatewayToken, SecurityGateway};
use crate::errors::GatewayError;
use async_trait::async_trait;
use common::secret::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Path of the token endpoint relative to the configured URL.
pub const TOKEN_ENDPOINT_PATH: &str = "/oauth/token";

/// Connection establishment timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Deserialize)]
struct OAuthTokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: String,
    expires_in: u64,
}

impl fmt::Debug for OAuthTokenResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Acquires delegated tokens with the client-credentials grant.
pub struct ClientCredentialsGateway {
    config: GatewayConfig,
    token_url: String,
    http_client: reqwest::Client,
}

impl ClientCredentialsGateway {
    /// Create a gateway.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Http` if the HTTP client cannot be built.
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Http(format!("Failed to build HTTP client: {e}")))?;

        let token_url = format!("{}{TOKEN_ENDPOINT_PATH}", config.url.trim_end_matches('/'));

        Ok(Self {
            config,
            token_url,
            http_client,
        })
    }

    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    async fn request_token(&self) -> Result<GatewayToken, GatewayError> {
        tracing::debug!(
            target: "auth.gateway",
            client_id = %self.config.client_id,
            url = %self.token_url,
            "Requesting token"
        );

        let form_body = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.expose_secret()),
        ];

        let response = self
            .http_client
            .post(&self.token_url)
            .form(&form_body)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(target: "auth.gateway", error = %e, "HTTP request failed");
                GatewayError::Http(e.to_string())
            })?;

        let status = response.status();

        if status.is_success() {
            let token_response: OAuthTokenResponse = response.json().await.map_err(|e| {
                tracing::warn!(target: "auth.gateway", error = %e, "Failed to parse token response");
                GatewayError::InvalidResponse(e.to_string())
            })?;

            if token_response.access_token.is_empty() {
                return Err(GatewayError::InvalidResponse(
                    "Empty access token".to_string(),
                ));
            }

            tracing::debug!(
                target: "auth.gateway",
                expires_in_secs = token_response.expires_in,
                "Token acquired"
            );

            Ok(GatewayToken {
                token_type: token_response.token_type,
                access_token: SecretString::from(token_response.access_token),
                expires_in_seconds: token_response.expires_in,
            })
        } else if status.as_u16() == 401 || status.as_u16() == 400 {
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::trace!(target: "auth.gateway", error = %e, "Failed to read error response body");
                "<failed to read body>".to_string()
            });
            tracing::warn!(target: "auth.gateway", status = %status, "Credentials rejected");
            tracing::trace!(target: "auth.gateway", body = %body, "Rejection response body");
            Err(GatewayError::Rejected(format!("Status {status}")))
        } else if status.is_server_error() {
            tracing::warn!(target: "auth.gateway", status = %status, "Token endpoint server error");
            Err(GatewayError::Http(format!("Server error: {status}")))
        } else {
            tracing::warn!(target: "auth.gateway", status = %status, "Unexpected token endpoint response");
            Err(GatewayError::Http(format!("Unexpected status: {status}")))
        }
    }
}

#[async_trait]
impl SecurityGateway for ClientCredentialsGateway {
    #[instrument(skip_all)]
    async fn acquire_token(&self, cancel: &CancellationToken) -> Result<GatewayToken, GatewayError> {
        tokio::select! {
            () = cancel.cancelled() => {
                tracing::debug!(target: "auth.gateway", "Token request cancelled by shutdown");
                Err(GatewayError::Cancelled)
            }
            result = self.request_token() => result,
        }
    }
}

impl fmt::Debug for ClientCredentialsGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentialsGateway")
            .field("config", &self.config)
            .field("token_url", &self.token_url)
            .finish_non_exhaustive()
    }
}

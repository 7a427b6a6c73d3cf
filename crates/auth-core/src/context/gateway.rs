//! External token source for the security context provider.

use crate::errors::GatewayError;
use async_trait::async_trait;
use common::secret::SecretString;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// A delegated access token as returned by a [`SecurityGateway`].
#[derive(Clone)]
pub struct GatewayToken {
    pub token_type: String,
    pub access_token: SecretString,
    /// Lifetime relative to the moment the response was received.
    pub expires_in_seconds: u64,
}

impl fmt::Debug for GatewayToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayToken")
            .field("token_type", &self.token_type)
            .field("access_token", &"[REDACTED]")
            .field("expires_in_seconds", &self.expires_in_seconds)
            .finish()
    }
}

/// Acquires delegated tokens from an external authority.
///
/// Implementations do the network I/O; the provider only orchestrates.
/// `cancel` is the gateway's own shutdown signal, not an individual
/// caller's cancellation.
#[async_trait]
pub trait SecurityGateway: Send + Sync {
    async fn acquire_token(&self, cancel: &CancellationToken) -> Result<GatewayToken, GatewayError>;
}

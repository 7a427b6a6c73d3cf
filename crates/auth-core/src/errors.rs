use thiserror::Error;

/// Errors raised by key reconstruction, token issuance and token validation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed key material, issuer or audience. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// `build()` was called on a builder that has already been disposed.
    #[error("Security key builder has been disposed")]
    KeyDisposed,

    #[error("Cryptographic error: {0}")]
    Crypto(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Errors returned by a [`crate::context::SecurityGateway`].
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(String),

    /// The token endpoint refused the credentials (400/401).
    #[error("Authentication rejected: {0}")]
    Rejected(String),

    #[error("Invalid token response: {0}")]
    InvalidResponse(String),

    /// The gateway's own shutdown signal fired mid-request.
    #[error("Gateway request cancelled")]
    Cancelled,
}

/// Errors returned by [`crate::context::SecurityContextProvider`].
#[derive(Debug, Clone, Error)]
pub enum ContextError {
    /// The caller cancelled before a context was available. Cache state is untouched.
    #[error("Security context acquisition cancelled")]
    Cancelled,

    #[error("Security context acquisition failed: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ContextError {
    /// True for the cancellation outcome, which is not a failure.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ContextError::Cancelled)
    }
}

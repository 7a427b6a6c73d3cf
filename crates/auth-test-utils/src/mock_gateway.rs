//! Scriptable security gateway for provider tests.
//!
//! Provides a mock gateway that can be configured to:
//! - Succeed with a given token lifetime
//! - Fail with a given error
//! - Hold each call open for a delay (to exercise single-flight and
//!   cancellation)
//!
//! # Example
//!
//! ```rust,ignore
//! use auth_test_utils::MockSecurityGateway;
//!
//! let gateway = Arc::new(
//!     MockSecurityGateway::succeeding(3600).with_delay(Duration::from_millis(100)),
//! );
//! // ... drive a SecurityContextProvider ...
//! assert_eq!(gateway.call_count(), 1);
//! ```

use async_trait::async_trait;
use auth_core::context::{GatewayToken, SecurityGateway};
use auth_core::errors::GatewayError;
use common::secret::SecretString;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Mock [`SecurityGateway`] with call counters.
///
/// Tokens are numbered per call: `mock-token-1`, `mock-token-2`, ...
pub struct MockSecurityGateway {
    expires_in_seconds: u64,
    error: Option<GatewayError>,
    delay: Option<Duration>,
    call_count: AtomicUsize,
    completed_count: AtomicUsize,
    started: Notify,
}

impl MockSecurityGateway {
    /// Create a mock that returns tokens valid for `expires_in_seconds`.
    #[must_use]
    pub fn succeeding(expires_in_seconds: u64) -> Self {
        Self {
            expires_in_seconds,
            error: None,
            delay: None,
            call_count: AtomicUsize::new(0),
            completed_count: AtomicUsize::new(0),
            started: Notify::new(),
        }
    }

    /// Create a mock that always fails with `error`.
    #[must_use]
    pub fn failing(error: GatewayError) -> Self {
        Self {
            error: Some(error),
            ..Self::succeeding(0)
        }
    }

    /// Hold every call open for `delay` before answering.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of calls started.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Number of calls that ran to completion (success or scripted error).
    pub fn completed_count(&self) -> usize {
        self.completed_count.load(Ordering::SeqCst)
    }

    /// Wait until a call has started.
    pub async fn call_started(&self) {
        self.started.notified().await;
    }
}

#[async_trait]
impl SecurityGateway for MockSecurityGateway {
    async fn acquire_token(&self, cancel: &CancellationToken) -> Result<GatewayToken, GatewayError> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst) + 1;
        self.started.notify_one();

        if let Some(delay) = self.delay {
            tokio::select! {
                () = cancel.cancelled() => return Err(GatewayError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }

        self.completed_count.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.error {
            return Err(error.clone());
        }

        Ok(GatewayToken {
            token_type: "Bearer".to_string(),
            access_token: SecretString::from(format!("mock-token-{call}")),
            expires_in_seconds: self.expires_in_seconds,
        })
    }
}

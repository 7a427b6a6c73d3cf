//! Cached, single-flight acquisition of the current security context.
//!
//! # Flow
//!
//! 1. Fail fast if the caller is already cancelled.
//! 2. Return the cached context if its token is still valid.
//! 3. Wait for the provider's acquisition lock (cancellable).
//! 4. Re-check the cache: a concurrent caller may have just filled it.
//! 5. Spawn the gateway call. The spawned task owns the lock guard, so a
//!    caller cancelling at this point stops waiting but does not abort the
//!    call; waiters queued on the lock pick up its result from the cache.
//!
//! A cache entry expires at the exact expiry instant of its token. A failed
//! acquisition writes nothing.

use crate::context::cache::TokenCache;
use crate::context::gateway::SecurityGateway;
use crate::errors::{ContextError, GatewayError};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_cache_lookup, record_gateway_acquisition};
use crate::token::{Token, BEARER_TOKEN_TYPE};
use chrono::TimeDelta;
use common::clock::{Clock, TaggedDateTime};
use common::secret::SecretString;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Cache key used when none is configured.
pub const DEFAULT_CACHE_KEY: &str = "security-context";

/// The identity a security context acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    name: String,
}

impl Principal {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A principal paired with the token it currently presents.
#[derive(Debug)]
pub struct SecurityContext {
    principal: Principal,
    token: Token,
}

impl SecurityContext {
    #[must_use]
    pub fn new(principal: Principal, token: Token) -> Self {
        Self { principal, token }
    }

    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// `Authorization` header value for outgoing requests.
    #[must_use]
    pub fn authorization_header(&self) -> SecretString {
        self.token.authorization_header()
    }
}

/// State shared with spawned acquisition tasks.
struct Shared {
    gateway: Arc<dyn SecurityGateway>,
    cache: Arc<dyn TokenCache>,
    clock: Arc<dyn Clock>,
    principal: Principal,
    cache_key: String,
    shutdown: CancellationToken,
}

/// Hands out the current [`SecurityContext`], acquiring a fresh token through
/// the gateway only when the cached one is missing or expired.
pub struct SecurityContextProvider {
    shared: Arc<Shared>,
    lock: Arc<Mutex<()>>,
}

impl SecurityContextProvider {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn SecurityGateway>,
        cache: Arc<dyn TokenCache>,
        clock: Arc<dyn Clock>,
        principal: Principal,
    ) -> Self {
        Self::with_options(
            gateway,
            cache,
            clock,
            principal,
            DEFAULT_CACHE_KEY,
            CancellationToken::new(),
        )
    }

    /// Create a provider with an explicit cache key and gateway shutdown token.
    ///
    /// `shutdown` is handed to every gateway call. Cancelling it aborts
    /// in-flight calls, unlike a caller's own cancellation token.
    #[must_use]
    pub fn with_options(
        gateway: Arc<dyn SecurityGateway>,
        cache: Arc<dyn TokenCache>,
        clock: Arc<dyn Clock>,
        principal: Principal,
        cache_key: impl Into<String>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                gateway,
                cache,
                clock,
                principal,
                cache_key: cache_key.into(),
                shutdown,
            }),
            lock: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.shared.principal
    }

    #[must_use]
    pub fn cache_key(&self) -> &str {
        &self.shared.cache_key
    }

    /// Get the current security context.
    ///
    /// Concurrent callers on a cold cache share a single gateway call and
    /// receive the same `Arc`.
    ///
    /// # Errors
    ///
    /// - `ContextError::Cancelled` - `cancel` fired before a context was available
    /// - `ContextError::Gateway` - the gateway call failed; nothing was cached
    /// - `ContextError::Internal` - the acquisition task panicked
    #[instrument(skip_all)]
    pub async fn current_security_context(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Arc<SecurityContext>, ContextError> {
        if cancel.is_cancelled() {
            tracing::debug!(target: "auth.context", "Cancelled before acquisition");
            return Err(ContextError::Cancelled);
        }

        if let Some(context) = self.cached().await {
            return Ok(context);
        }

        let guard = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                tracing::debug!(target: "auth.context", "Cancelled while waiting for acquisition lock");
                return Err(ContextError::Cancelled);
            }
            guard = self.lock.clone().lock_owned() => guard,
        };

        // Another caller may have filled the cache while we waited
        if let Some(context) = self.cached().await {
            return Ok(context);
        }

        if cancel.is_cancelled() {
            return Err(ContextError::Cancelled);
        }

        let acquisition = tokio::spawn(acquire(self.shared.clone(), guard));

        tokio::select! {
            biased;
            joined = acquisition => joined.map_err(|e| {
                tracing::error!(target: "auth.context", error = %e, "Acquisition task failed");
                ContextError::Internal(format!("Acquisition task failed: {e}"))
            })?,
            () = cancel.cancelled() => {
                tracing::debug!(
                    target: "auth.context",
                    "Caller cancelled, in-flight acquisition continues"
                );
                Err(ContextError::Cancelled)
            }
        }
    }

    /// Drop the cached context so the next call reacquires.
    ///
    /// Returns whether an entry was removed.
    #[instrument(skip_all)]
    pub async fn invalidate(&self) -> bool {
        let removed = self.shared.cache.remove(&self.shared.cache_key).await;
        tracing::debug!(target: "auth.context", removed, "Security context invalidated");
        removed
    }

    async fn cached(&self) -> Option<Arc<SecurityContext>> {
        match self.shared.cache.get(&self.shared.cache_key).await {
            Some(context) if !context.token().is_expired(self.shared.clock.as_ref()) => {
                record_cache_lookup("hit");
                Some(context)
            }
            Some(_) => {
                record_cache_lookup("expired");
                None
            }
            None => {
                record_cache_lookup("miss");
                None
            }
        }
    }
}

impl fmt::Debug for SecurityContextProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityContextProvider")
            .field("principal", &self.shared.principal)
            .field("cache_key", &self.shared.cache_key)
            .finish_non_exhaustive()
    }
}

/// Call the gateway and cache the result. Holds the acquisition lock until done.
async fn acquire(
    shared: Arc<Shared>,
    _guard: OwnedMutexGuard<()>,
) -> Result<Arc<SecurityContext>, ContextError> {
    let principal_hash = hash_for_correlation(shared.principal.name());
    let start = Instant::now();
    let result = shared.gateway.acquire_token(&shared.shutdown).await;
    record_gateway_acquisition(
        if result.is_ok() { "success" } else { "error" },
        start.elapsed(),
    );

    let gateway_token = result.map_err(|e| {
        tracing::warn!(
            target: "auth.context",
            principal = %principal_hash,
            error = %e,
            "Security context acquisition failed"
        );
        ContextError::Gateway(e)
    })?;

    let received_at = shared.clock.now_utc();
    let expires_at = i64::try_from(gateway_token.expires_in_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|lifetime| received_at.checked_add_signed(lifetime))
        .ok_or_else(|| {
            ContextError::Gateway(GatewayError::InvalidResponse(
                "Token lifetime out of range".to_string(),
            ))
        })?;

    let token_type = if gateway_token.token_type.is_empty() {
        BEARER_TOKEN_TYPE.to_string()
    } else {
        gateway_token.token_type
    };
    let context = Arc::new(SecurityContext::new(
        shared.principal.clone(),
        Token::new(
            token_type,
            gateway_token.access_token,
            TaggedDateTime::utc(expires_at),
        ),
    ));

    shared
        .cache
        .insert(&shared.cache_key, context.clone(), expires_at)
        .await;

    tracing::info!(
        target: "auth.context",
        principal = %principal_hash,
        expires_in_secs = gateway_token.expires_in_seconds,
        "Security context acquired"
    );

    Ok(context)
}

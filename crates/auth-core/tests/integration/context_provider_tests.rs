//! Integration tests for cached, single-flight security context acquisition
//!
//! Drives `SecurityContextProvider` with `MockSecurityGateway`, a shared
//! `MemoryTokenCache` and a `MockClock`, covering:
//! - one gateway call for a burst of concurrent callers
//! - reuse until the token's expiry instant, reacquisition at it
//! - cancellation before, during the lock wait and after the call started
//! - failures leaving the cache untouched

use auth_core::context::{
    MemoryTokenCache, Principal, SecurityContextProvider, TokenCache, DEFAULT_CACHE_KEY,
};
use auth_core::errors::{ContextError, GatewayError};
use auth_test_utils::*;
use chrono::TimeDelta;
use common::secret::ExposeSecret;
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Helper Functions
// ============================================================================

struct Harness {
    provider: Arc<SecurityContextProvider>,
    gateway: Arc<MockSecurityGateway>,
    cache: Arc<MemoryTokenCache>,
    clock: Arc<MockClock>,
}

fn harness(gateway: MockSecurityGateway) -> Harness {
    harness_with_shutdown(gateway, CancellationToken::new())
}

fn harness_with_shutdown(gateway: MockSecurityGateway, shutdown: CancellationToken) -> Harness {
    let gateway = Arc::new(gateway);
    let clock = Arc::new(MockClock::new());
    let cache = Arc::new(MemoryTokenCache::new(clock.clone()));
    let provider = Arc::new(SecurityContextProvider::with_options(
        gateway.clone(),
        cache.clone(),
        clock.clone(),
        Principal::new(TEST_PRINCIPAL),
        DEFAULT_CACHE_KEY,
        shutdown,
    ));
    Harness {
        provider,
        gateway,
        cache,
        clock,
    }
}

// ============================================================================
// Single-flight
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_one_acquisition() -> Result<(), anyhow::Error> {
    let h = harness(MockSecurityGateway::succeeding(3600).with_delay(Duration::from_millis(50)));

    let callers = (0..16).map(|_| {
        let provider = h.provider.clone();
        tokio::spawn(async move {
            provider
                .current_security_context(&CancellationToken::new())
                .await
        })
    });
    let results = join_all(callers).await;

    let mut contexts = Vec::new();
    for joined in results {
        contexts.push(joined??);
    }

    assert_eq!(h.gateway.call_count(), 1);
    let first = contexts
        .first()
        .ok_or_else(|| anyhow::anyhow!("no contexts"))?;
    assert!(contexts.iter().all(|c| Arc::ptr_eq(c, first)));
    assert_eq!(first.token().value().expose_secret(), "mock-token-1");
    assert_eq!(first.principal().name(), TEST_PRINCIPAL);
    Ok(())
}

// ============================================================================
// Cache lifetime
// ============================================================================

#[tokio::test]
async fn test_context_reused_until_expiry_then_reacquired() -> Result<(), anyhow::Error> {
    let h = harness(MockSecurityGateway::succeeding(3600));
    let cancel = CancellationToken::new();

    let first = h.provider.current_security_context(&cancel).await?;
    assert_eq!(
        first.token().expires().to_utc(),
        h.clock.peek() + TimeDelta::seconds(3600)
    );

    // One millisecond before expiry: same instance
    h.clock.advance(TimeDelta::seconds(3600) - TimeDelta::milliseconds(1));
    let again = h.provider.current_security_context(&cancel).await?;
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(h.gateway.call_count(), 1);

    // At expiry: fresh acquisition
    h.clock.advance(TimeDelta::milliseconds(1));
    let renewed = h.provider.current_security_context(&cancel).await?;
    assert!(!Arc::ptr_eq(&first, &renewed));
    assert_eq!(h.gateway.call_count(), 2);
    assert_eq!(renewed.token().value().expose_secret(), "mock-token-2");
    Ok(())
}

#[tokio::test]
async fn test_cache_entry_expires_with_token() -> Result<(), anyhow::Error> {
    let h = harness(MockSecurityGateway::succeeding(120));

    h.provider
        .current_security_context(&CancellationToken::new())
        .await?;
    assert!(h.cache.get(DEFAULT_CACHE_KEY).await.is_some());

    h.clock.advance_secs(120);
    assert!(h.cache.get(DEFAULT_CACHE_KEY).await.is_none());
    assert!(h.cache.is_empty().await);
    Ok(())
}

#[tokio::test]
async fn test_invalidate_drops_cached_context() -> Result<(), anyhow::Error> {
    let h = harness(MockSecurityGateway::succeeding(3600));
    let cancel = CancellationToken::new();

    h.provider.current_security_context(&cancel).await?;
    assert!(h.provider.invalidate().await);
    assert!(!h.provider.invalidate().await);

    let renewed = h.provider.current_security_context(&cancel).await?;
    assert_eq!(h.gateway.call_count(), 2);
    assert_eq!(
        renewed.authorization_header().expose_secret(),
        "Bearer mock-token-2"
    );
    Ok(())
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_before_acquisition_leaves_cache_untouched() -> Result<(), anyhow::Error> {
    let h = harness(MockSecurityGateway::succeeding(3600));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = h.provider.current_security_context(&cancel).await;

    assert!(matches!(result, Err(ContextError::Cancelled)));
    assert_eq!(h.gateway.call_count(), 0);
    assert!(h.cache.is_empty().await);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_while_waiting_for_lock() -> Result<(), anyhow::Error> {
    let h = harness(MockSecurityGateway::succeeding(3600).with_delay(Duration::from_millis(200)));

    let leader = {
        let provider = h.provider.clone();
        tokio::spawn(async move {
            provider
                .current_security_context(&CancellationToken::new())
                .await
        })
    };
    h.gateway.call_started().await;

    let waiter_cancel = CancellationToken::new();
    let waiter = {
        let provider = h.provider.clone();
        let cancel = waiter_cancel.clone();
        tokio::spawn(async move { provider.current_security_context(&cancel).await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    waiter_cancel.cancel();

    assert!(matches!(waiter.await?, Err(ContextError::Cancelled)));
    let context = leader.await??;
    assert_eq!(context.token().value().expose_secret(), "mock-token-1");
    assert_eq!(h.gateway.call_count(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancel_after_gateway_call_started_does_not_abort_it() -> Result<(), anyhow::Error> {
    let h = harness(MockSecurityGateway::succeeding(3600).with_delay(Duration::from_millis(100)));
    let cancel = CancellationToken::new();

    let caller = {
        let provider = h.provider.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move { provider.current_security_context(&cancel).await })
    };
    h.gateway.call_started().await;
    cancel.cancel();

    let result = caller.await?;
    assert!(result.unwrap_err().is_cancelled());

    // A later caller waits for the in-flight call and reuses its result
    let context = h
        .provider
        .current_security_context(&CancellationToken::new())
        .await?;
    assert_eq!(context.token().value().expose_secret(), "mock-token-1");
    assert_eq!(h.gateway.call_count(), 1);
    assert_eq!(h.gateway.completed_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_gateway_shutdown_aborts_in_flight_call() -> Result<(), anyhow::Error> {
    let shutdown = CancellationToken::new();
    let h = harness_with_shutdown(
        MockSecurityGateway::succeeding(3600).with_delay(Duration::from_secs(30)),
        shutdown.clone(),
    );
    shutdown.cancel();

    let result = h
        .provider
        .current_security_context(&CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(ContextError::Gateway(GatewayError::Cancelled))
    ));
    assert!(h.cache.is_empty().await);
    Ok(())
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_failed_acquisition_writes_nothing_and_is_retried() -> Result<(), anyhow::Error> {
    let h = harness(MockSecurityGateway::failing(GatewayError::Http(
        "503 Service Unavailable".to_string(),
    )));
    let cancel = CancellationToken::new();

    let first = h.provider.current_security_context(&cancel).await;
    assert!(matches!(first, Err(ContextError::Gateway(GatewayError::Http(_)))));
    assert!(h.cache.is_empty().await);

    // Not cached as a failure: the next call goes back to the gateway
    let second = h.provider.current_security_context(&cancel).await;
    assert!(second.is_err());
    assert_eq!(h.gateway.call_count(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_failures_serialize_gateway_calls() -> Result<(), anyhow::Error> {
    let h = harness(
        MockSecurityGateway::failing(GatewayError::Rejected("Status 401".to_string()))
            .with_delay(Duration::from_millis(20)),
    );

    let callers = (0..4).map(|_| {
        let provider = h.provider.clone();
        tokio::spawn(async move {
            provider
                .current_security_context(&CancellationToken::new())
                .await
        })
    });

    for joined in join_all(callers).await {
        assert!(matches!(
            joined?,
            Err(ContextError::Gateway(GatewayError::Rejected(_)))
        ));
    }
    // Each waiter found an empty cache and made its own attempt, one at a time
    assert_eq!(h.gateway.call_count(), 4);
    assert!(h.cache.is_empty().await);
    Ok(())
}

//! Metrics definitions for the security core.
//!
//! All metrics follow Prometheus naming conventions:
//! - `auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `status`: 2 values (success, error)
//! - `kind`: 2 values (public, private)
//! - `result`: 3 values (hit, miss, expired)

use metrics::{counter, histogram};
use std::time::Duration;

// ============================================================================
// Key Metrics
// ============================================================================

/// Record a security key build.
///
/// Metric: `auth_security_key_builds_total`
/// Labels: `kind`, `status`
pub fn record_key_build(kind: &str, status: &str) {
    counter!("auth_security_key_builds_total", "kind" => kind.to_string(), "status" => status.to_string())
        .increment(1);
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record token issuance duration and outcome.
///
/// Metric: `auth_token_issuance_duration_seconds`, `auth_token_issuance_total`
/// Labels: `status`
pub fn record_token_issuance(status: &str, duration: Duration) {
    histogram!("auth_token_issuance_duration_seconds", "status" => status.to_string())
        .record(duration.as_secs_f64());

    counter!("auth_token_issuance_total", "status" => status.to_string()).increment(1);
}

// ============================================================================
// Security Context Metrics
// ============================================================================

/// Record a security context cache lookup.
///
/// Metric: `auth_context_cache_lookups_total`
/// Labels: `result` (hit, miss, expired)
pub fn record_cache_lookup(result: &str) {
    counter!("auth_context_cache_lookups_total", "result" => result.to_string()).increment(1);
}

/// Record a gateway token acquisition.
///
/// Metric: `auth_gateway_acquisition_duration_seconds`, `auth_gateway_acquisitions_total`
/// Labels: `status`
pub fn record_gateway_acquisition(status: &str, duration: Duration) {
    histogram!("auth_gateway_acquisition_duration_seconds").record(duration.as_secs_f64());

    counter!("auth_gateway_acquisitions_total", "status" => status.to_string()).increment(1);
}

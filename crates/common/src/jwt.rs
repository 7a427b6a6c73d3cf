//! JWT utilities shared across the security crates.
//!
//! This module provides:
//! - Size limits for DoS prevention
//! - Key ID extraction from JWT headers
//! - Decoding of base64url unsigned integers (JWK `n`, `e`, `d`, ...)
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Generic error messages prevent information leakage
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{check_token_size, extract_kid};
//!
//! check_token_size(token)?;
//! let kid = extract_kid(token)?;
//! ```

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this size are rejected BEFORE any parsing or cryptographic
/// operations.
///
/// - An RS256 token with a handful of claims is roughly 600-900 bytes
/// - 8KB leaves room for large claim sets while bounding decode cost
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during JWT inspection.
///
/// Note: Error messages are intentionally generic to prevent information leakage.
/// Detailed information is logged at debug level for troubleshooting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid or expired")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid or expired")]
    MalformedToken,

    /// Token is missing the `kid` header.
    #[error("The access token is invalid or expired")]
    MissingKid,
}

// =============================================================================
// Functions
// =============================================================================

/// Reject tokens larger than [`MAX_JWT_SIZE_BYTES`].
///
/// # Errors
///
/// Returns `JwtValidationError::TokenTooLarge` if the token exceeds the limit.
pub fn check_token_size(token: &str) -> Result<(), JwtValidationError> {
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }
    Ok(())
}

/// Extract the `kid` (key ID) from a JWT header without verifying the signature.
///
/// # Security
///
/// - Token size is checked BEFORE any parsing
/// - This function does NOT validate the token signature
/// - The `kid` value should only be used for key selection
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds `MAX_JWT_SIZE_BYTES`
/// - `MalformedToken` - Wrong structure, bad base64, or invalid JSON header
/// - `MissingKid` - Header has no `kid`, or `kid` is not a non-empty string
pub fn extract_kid(token: &str) -> Result<String, JwtValidationError> {
    check_token_size(token)?;

    // JWT format: header.payload.signature
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    let header_part = parts.first().ok_or(JwtValidationError::MalformedToken)?;
    let header_bytes = URL_SAFE_NO_PAD.decode(header_part).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to decode JWT header base64");
        JwtValidationError::MalformedToken
    })?;

    let header: serde_json::Value = serde_json::from_slice(&header_bytes).map_err(|e| {
        tracing::debug!(target: "common.jwt", error = %e, "Failed to parse JWT header JSON");
        JwtValidationError::MalformedToken
    })?;

    header
        .get("kid")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .ok_or(JwtValidationError::MissingKid)
}

/// Decode a JWK base64url unsigned integer (RFC 7518 `Base64urlUInt`) to
/// big-endian bytes.
///
/// Trailing `=` padding is tolerated; some producers emit it.
///
/// # Errors
///
/// Returns `base64::DecodeError` if the input is not valid base64url.
pub fn decode_base64url_uint(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(value.trim_end_matches('='))
}

/// Encode big-endian bytes as a JWK base64url unsigned integer.
#[must_use]
pub fn encode_base64url_uint(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

// =============================================================================
// Tests
// =============================================================================

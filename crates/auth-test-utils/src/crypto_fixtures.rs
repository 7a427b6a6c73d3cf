//! Deterministic cryptographic fixtures for testing
//!
//! Two fixed 2048-bit RSA signing keys stored as JWK JSON under `fixtures/`.
//! The same index always yields the same key material.

use crate::test_ids::{TEST_AUDIENCE, TEST_ISSUER};
use auth_core::crypto::{build_security_key, JsonWebKey, SecurityKey};
use auth_core::issuance::TokenIssuer;
use common::clock::Clock;
use std::sync::Arc;
use thiserror::Error;

const RSA_SIGNING_KEY_1: &str = include_str!("../fixtures/rsa_signing_key_1.json");
const RSA_SIGNING_KEY_2: &str = include_str!("../fixtures/rsa_signing_key_2.json");

/// Test fixture error type
#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("No signing key fixture with index {0}")]
    UnknownKey(u8),

    #[error("Fixture JWK does not parse: {0}")]
    Parse(String),

    #[error("Fixture key rejected: {0}")]
    Key(String),
}

/// JSON text of signing key fixture `index` (1 or 2).
///
/// # Errors
///
/// Returns `FixtureError::UnknownKey` for any other index.
pub fn test_signing_jwk_json(index: u8) -> Result<&'static str, FixtureError> {
    match index {
        1 => Ok(RSA_SIGNING_KEY_1),
        2 => Ok(RSA_SIGNING_KEY_2),
        other => Err(FixtureError::UnknownKey(other)),
    }
}

/// Full private signing JWK `index` (1 or 2).
///
/// # Example
/// ```rust,ignore
/// let jwk = test_signing_jwk(1)?;
/// assert_eq!(jwk.kid.as_deref(), Some(TEST_KEY_ID_1));
/// ```
pub fn test_signing_jwk(index: u8) -> Result<JsonWebKey, FixtureError> {
    JsonWebKey::from_json(test_signing_jwk_json(index)?)
        .map_err(|e| FixtureError::Parse(e.to_string()))
}

/// Public half of signing JWK `index`.
pub fn test_public_jwk(index: u8) -> Result<JsonWebKey, FixtureError> {
    Ok(test_signing_jwk(index)?.to_public())
}

/// Signing-capable key built from fixture `index`.
pub fn test_security_key(index: u8) -> Result<Arc<SecurityKey>, FixtureError> {
    build_security_key(&test_signing_jwk(index)?)
        .map(Arc::new)
        .map_err(|e| FixtureError::Key(e.to_string()))
}

/// Verification-only key built from the public half of fixture `index`.
pub fn test_verification_key(index: u8) -> Result<Arc<SecurityKey>, FixtureError> {
    build_security_key(&test_public_jwk(index)?)
        .map(Arc::new)
        .map_err(|e| FixtureError::Key(e.to_string()))
}

/// Issuer for [`TEST_ISSUER`] / [`TEST_AUDIENCE`] signing with fixture `index`.
pub fn test_token_issuer(index: u8, clock: Arc<dyn Clock>) -> Result<TokenIssuer, FixtureError> {
    TokenIssuer::new(test_security_key(index)?, TEST_ISSUER, TEST_AUDIENCE, clock)
        .map_err(|e| FixtureError::Key(e.to_string()))
}

//! Integration tests for JWK → RSA key reconstruction
//!
//! Covers lossless parameter round-trips for both fixture keys, builder
//! reuse and disposal, and sign/verify interoperability between keys built
//! from the same material.

use auth_core::crypto::{JsonWebKey, SecurityKeyBuilder};
use auth_core::errors::AuthError;
use auth_core::validation::build_validation_policy;
use auth_test_utils::*;
use common::jwt::{decode_base64url_uint, encode_base64url_uint};
use common::secret::{ExposeSecret, SecretString};
use std::sync::Arc;

// ============================================================================
// Helper Functions
// ============================================================================

fn member(value: Option<&String>) -> Result<Vec<u8>, anyhow::Error> {
    let value = value.ok_or_else(|| anyhow::anyhow!("fixture member missing"))?;
    Ok(decode_base64url_uint(value)?)
}

fn secret_member(value: Option<&SecretString>) -> Result<Vec<u8>, anyhow::Error> {
    let value = value.ok_or_else(|| anyhow::anyhow!("fixture member missing"))?;
    Ok(decode_base64url_uint(value.expose_secret())?)
}

// ============================================================================
// Round-trip
// ============================================================================

#[test]
fn test_export_matches_source_members_exactly() -> Result<(), anyhow::Error> {
    for index in [1, 2] {
        let jwk = test_signing_jwk(index)?;
        let builder = SecurityKeyBuilder::new(&jwk)?;
        let key = builder.build()?;

        let exported = key.export_parameters(true);
        let private = exported
            .private
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("private parameters missing"))?;

        assert_eq!(exported.modulus, member(jwk.n.as_ref())?, "n, key {index}");
        assert_eq!(exported.exponent, member(jwk.e.as_ref())?, "e, key {index}");
        assert_eq!(*private.d.expose_secret(), secret_member(jwk.d.as_ref())?, "d, key {index}");
        assert_eq!(*private.p.expose_secret(), secret_member(jwk.p.as_ref())?, "p, key {index}");
        assert_eq!(*private.q.expose_secret(), secret_member(jwk.q.as_ref())?, "q, key {index}");
        assert_eq!(*private.dp.expose_secret(), secret_member(jwk.dp.as_ref())?, "dp, key {index}");
        assert_eq!(*private.dq.expose_secret(), secret_member(jwk.dq.as_ref())?, "dq, key {index}");
        assert_eq!(*private.qi.expose_secret(), secret_member(jwk.qi.as_ref())?, "qi, key {index}");
    }
    Ok(())
}

#[test]
fn test_export_without_private_flag_omits_private_parameters() -> Result<(), anyhow::Error> {
    let key = test_security_key(1)?;
    let exported = key.export_parameters(false);

    assert!(exported.private.is_none());
    assert_eq!(exported.modulus.len() * 8, 2048);
    Ok(())
}

#[test]
fn test_public_only_key_round_trips_public_members() -> Result<(), anyhow::Error> {
    let jwk = test_public_jwk(2)?;
    let key = SecurityKeyBuilder::new(&jwk)?.build()?;

    assert!(!key.has_private_key());
    assert!(key.encoding_key().is_none());
    let exported = key.export_parameters(true);
    assert!(exported.private.is_none());
    assert_eq!(exported.modulus, member(jwk.n.as_ref())?);
    assert_eq!(key.key_id(), Some(TEST_KEY_ID_2));
    Ok(())
}

#[test]
fn test_small_public_key_round_trips() -> Result<(), anyhow::Error> {
    let mut modulus = vec![0xC3_u8; 127];
    modulus.push(0xC5);
    let jwk = JsonWebKey::rsa_public(encode_base64url_uint(&modulus), "AQAB");

    let key = SecurityKeyBuilder::new(&jwk)?.build()?;
    let exported = key.export_parameters(true);

    assert_eq!(key.modulus_bits(), 1024);
    assert_eq!(exported.modulus, modulus);
    assert_eq!(exported.exponent, vec![0x01, 0x00, 0x01]);
    assert!(exported.private.is_none());
    assert_eq!(key.to_public_jwk().n, jwk.n);

    // Usable for verification
    assert!(build_validation_policy(TEST_ISSUER, TEST_AUDIENCE, Arc::new(key)).is_ok());
    Ok(())
}

#[test]
fn test_public_jwk_export_matches_source() -> Result<(), anyhow::Error> {
    let jwk = test_signing_jwk(1)?;
    let exported = test_security_key(1)?.to_public_jwk();

    assert_eq!(exported.n, jwk.n);
    assert_eq!(exported.e, jwk.e);
    assert_eq!(exported.kid.as_deref(), Some(TEST_KEY_ID_1));
    assert_eq!(exported.private_member_count(), 0);
    assert_eq!(exported.public_json()["alg"], "RS256");
    Ok(())
}

// ============================================================================
// Builder lifecycle
// ============================================================================

#[test]
fn test_builder_produces_equivalent_keys() -> Result<(), anyhow::Error> {
    let builder = SecurityKeyBuilder::new(&test_signing_jwk(1)?)?;
    let signing = Arc::new(builder.build()?);
    let verifying = Arc::new(builder.build()?);

    let clock = Arc::new(MockClock::new());
    let issuer = auth_core::issuance::TokenIssuer::new(
        signing,
        TEST_ISSUER,
        TEST_AUDIENCE,
        clock.clone(),
    )?;
    let token = issuer.generate(&TestIdentityBuilder::new().build(), None, None)?;

    let policy = build_validation_policy(TEST_ISSUER, TEST_AUDIENCE, verifying)?;
    policy.validate(token.value().expose_secret(), clock.as_ref())?;
    Ok(())
}

#[test]
fn test_dispose_is_idempotent_and_blocks_build() -> Result<(), anyhow::Error> {
    let mut builder = SecurityKeyBuilder::new(&test_signing_jwk(1)?)?;
    let key = builder.build()?;

    builder.dispose();
    builder.dispose();

    assert!(builder.is_disposed());
    assert!(matches!(builder.build(), Err(AuthError::KeyDisposed)));
    // Keys already built stay usable
    assert!(key.has_private_key());
    Ok(())
}

#[test]
fn test_partial_private_key_rejected() -> Result<(), anyhow::Error> {
    let mut jwk: JsonWebKey = test_signing_jwk(1)?;
    jwk.qi = None;
    jwk.dq = None;

    let result = SecurityKeyBuilder::new(&jwk);
    assert!(
        matches!(&result, Err(AuthError::Configuration(msg)) if msg.contains("dq") && msg.contains("qi")),
        "{result:?}"
    );
    Ok(())
}

#[test]
fn test_mismatched_private_exponent_rejected() -> Result<(), anyhow::Error> {
    // d from another key does not belong to this modulus
    let mut jwk = test_signing_jwk(1)?;
    jwk.d = test_signing_jwk(2)?.d;

    let builder = SecurityKeyBuilder::new(&jwk)?;
    assert!(matches!(builder.build(), Err(AuthError::Configuration(_))));
    Ok(())
}

//! Integration tests for token issuance
//!
//! Issues tokens with the fixture keys under a controlled clock and checks
//! the token shape, its expiry arithmetic and that each issued token
//! validates independently until its own expiry.

use auth_core::config::AuthConfig;
use auth_core::errors::AuthError;
use auth_core::issuance::{TokenIssuer, DEFAULT_TOKEN_LIFETIME};
use auth_core::token::BEARER_TOKEN_TYPE;
use auth_core::validation::build_validation_policy;
use auth_test_utils::*;
use chrono::TimeDelta;
use common::clock::Clock;
use common::jwt::extract_kid;
use common::secret::ExposeSecret;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Token shape
// ============================================================================

#[test]
fn test_generate_returns_bearer_with_default_lifetime() -> Result<(), anyhow::Error> {
    let clock = Arc::new(MockClock::new());
    let issuer = test_token_issuer(1, clock.clone())?;
    let issued_at = clock.peek();

    let token = issuer.generate(&TestIdentityBuilder::new().build(), None, None)?;

    assert!(!token.value().expose_secret().is_empty());
    assert_eq!(token.token_type(), BEARER_TOKEN_TYPE);
    let drift = token.expires().to_utc() - (issued_at + TimeDelta::from_std(DEFAULT_TOKEN_LIFETIME)?);
    assert!(drift.num_milliseconds().abs() < 1000, "drift {drift}");
    Ok(())
}

#[test]
fn test_generate_honours_requested_lifetime() -> Result<(), anyhow::Error> {
    let clock = Arc::new(MockClock::new());
    let issuer = test_token_issuer(1, clock.clone())?;

    let token = issuer.generate(
        &TestIdentityBuilder::new().build(),
        Some(Duration::from_secs(90)),
        None,
    )?;

    assert_eq!(token.expires().to_utc(), clock.peek() + TimeDelta::seconds(90));
    Ok(())
}

#[test]
fn test_generate_stamps_fixture_kid() -> Result<(), anyhow::Error> {
    let issuer = test_token_issuer(2, Arc::new(MockClock::new()))?;
    let token = issuer.generate(&TestIdentityBuilder::new().build(), None, None)?;

    assert_eq!(extract_kid(token.value().expose_secret())?, TEST_KEY_ID_2);
    Ok(())
}

#[test]
fn test_verification_only_key_cannot_issue() -> Result<(), anyhow::Error> {
    let result = TokenIssuer::new(
        test_verification_key(1)?,
        TEST_ISSUER,
        TEST_AUDIENCE,
        Arc::new(MockClock::new()),
    );

    assert!(matches!(result, Err(AuthError::Configuration(_))));
    Ok(())
}

// ============================================================================
// Determinism and expiry
// ============================================================================

#[test]
fn test_tokens_issued_at_different_instants_differ_and_expire_independently(
) -> Result<(), anyhow::Error> {
    let clock = Arc::new(MockClock::new());
    let issuer = test_token_issuer(1, clock.clone())?;
    let identity = TestIdentityBuilder::new().with_role(ROLE_ACCOUNTANT).build();
    let lifetime = Some(Duration::from_secs(600));

    let first = issuer.generate(&identity, lifetime, None)?;
    clock.advance_secs(60);
    let second = issuer.generate(&identity, lifetime, None)?;

    assert_ne!(
        first.value().expose_secret(),
        second.value().expose_secret()
    );
    assert_eq!(
        second.expires().to_utc() - first.expires().to_utc(),
        TimeDelta::seconds(60)
    );

    let policy = build_validation_policy(TEST_ISSUER, TEST_AUDIENCE, test_verification_key(1)?)?;
    policy.validate(first.value().expose_secret(), clock.as_ref())?;
    policy.validate(second.value().expose_secret(), clock.as_ref())?;

    // First expires, second is still good
    clock.advance_secs(540);
    assert!(first.is_expired(clock.as_ref()));
    assert!(!second.is_expired(clock.as_ref()));
    assert!(policy.validate(first.value().expose_secret(), clock.as_ref()).is_err());
    policy.validate(second.value().expose_secret(), clock.as_ref())?;

    clock.advance_secs(60);
    assert!(second.is_expired(clock.as_ref()));
    Ok(())
}

#[test]
fn test_is_expired_reads_clock_once() -> Result<(), anyhow::Error> {
    let clock = Arc::new(MockClock::new());
    let issuer = test_token_issuer(1, clock.clone())?;
    let token = issuer.generate(&TestIdentityBuilder::new().build(), None, None)?;

    let before = clock.read_count();
    let _ = token.is_expired(clock.as_ref());
    assert_eq!(clock.read_count(), before + 1);
    Ok(())
}

// ============================================================================
// Audience and configuration
// ============================================================================

#[test]
fn test_audience_override_restricts_token() -> Result<(), anyhow::Error> {
    let clock = Arc::new(MockClock::new());
    let issuer = test_token_issuer(1, clock.clone())?;
    let token = issuer.generate(
        &TestIdentityBuilder::new().build(),
        None,
        Some(TEST_OTHER_AUDIENCE),
    )?;

    let default_policy =
        build_validation_policy(TEST_ISSUER, TEST_AUDIENCE, test_verification_key(1)?)?;
    let other_policy =
        build_validation_policy(TEST_ISSUER, TEST_OTHER_AUDIENCE, test_verification_key(1)?)?;

    assert!(default_policy
        .validate(token.value().expose_secret(), clock.as_ref())
        .is_err());
    other_policy.validate(token.value().expose_secret(), clock.as_ref())?;
    Ok(())
}

#[test]
fn test_issuer_from_config() -> Result<(), anyhow::Error> {
    let vars = HashMap::from([
        ("AUTH_SIGNING_JWK".to_string(), test_signing_jwk_json(1)?.to_string()),
        ("AUTH_ISSUER".to_string(), TEST_ISSUER.to_string()),
        ("AUTH_AUDIENCE".to_string(), TEST_AUDIENCE.to_string()),
        ("AUTH_TOKEN_LIFETIME_SECONDS".to_string(), "300".to_string()),
    ]);
    let config = AuthConfig::from_vars(&vars)?;
    let clock = Arc::new(MockClock::new());

    let issuer = TokenIssuer::from_config(&config, clock.clone())?;
    let token = issuer.generate(&TestIdentityBuilder::new().build(), None, None)?;

    assert_eq!(issuer.default_lifetime(), Duration::from_secs(300));
    assert_eq!(token.expires().to_utc(), clock.now_utc() + TimeDelta::seconds(300));
    Ok(())
}

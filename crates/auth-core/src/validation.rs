//! Validation policy for incoming bearer tokens.
//!
//! [`build_validation_policy`] assembles issuer, audience, signing key and a
//! lifetime predicate into a [`ValidationPolicy`]. The predicate is a plain
//! function value so it can be swapped and unit tested on its own.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Only RS256 is accepted
//! - Generic error messages prevent information leakage

use crate::crypto::SecurityKey;
use crate::errors::AuthError;
use chrono::{DateTime, Utc};
use common::clock::{Clock, TaggedDateTime};
use common::jwt::check_token_size;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

const INVALID_TOKEN_MESSAGE: &str = "The access token is invalid or expired";

/// Lifetime predicate: `(not_before, expires, now) -> valid`.
pub type LifetimeValidator =
    fn(Option<TaggedDateTime>, Option<TaggedDateTime>, DateTime<Utc>) -> bool;

/// Default lifetime predicate.
///
/// Rejects a token missing either bound. Both bounds are normalized to UTC
/// (converted only when not already flagged UTC), then the token is valid iff
/// `not_before <= now < expires`.
#[must_use]
pub fn validate_lifetime(
    not_before: Option<TaggedDateTime>,
    expires: Option<TaggedDateTime>,
    now: DateTime<Utc>,
) -> bool {
    let (Some(not_before), Some(expires)) = (not_before, expires) else {
        return false;
    };
    not_before.to_utc() <= now && now < expires.to_utc()
}

/// Checks a downstream consumer applies to incoming tokens.
#[derive(Clone)]
pub struct ValidationPolicy {
    issuer: String,
    audience: String,
    key: Arc<SecurityKey>,
    lifetime_validator: LifetimeValidator,
}

/// Build a policy requiring issuer match, audience match, an RS256 signature
/// under `key`, and [`validate_lifetime`].
///
/// # Errors
///
/// Returns `AuthError::Configuration` if the issuer or audience is empty.
pub fn build_validation_policy(
    issuer: impl Into<String>,
    audience: impl Into<String>,
    key: Arc<SecurityKey>,
) -> Result<ValidationPolicy, AuthError> {
    let issuer = issuer.into();
    let audience = audience.into();
    if issuer.is_empty() {
        return Err(AuthError::Configuration("Issuer is required".to_string()));
    }
    if audience.is_empty() {
        return Err(AuthError::Configuration("Audience is required".to_string()));
    }

    Ok(ValidationPolicy {
        issuer,
        audience,
        key,
        lifetime_validator: validate_lifetime,
    })
}

impl ValidationPolicy {
    /// Replace the lifetime predicate.
    #[must_use]
    pub fn with_lifetime_validator(mut self, validator: LifetimeValidator) -> Self {
        self.lifetime_validator = validator;
        self
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn audience(&self) -> &str {
        &self.audience
    }

    #[must_use]
    pub fn key(&self) -> &Arc<SecurityKey> {
        &self.key
    }

    #[must_use]
    pub fn lifetime_validator(&self) -> LifetimeValidator {
        self.lifetime_validator
    }

    /// Apply the lifetime predicate.
    #[must_use]
    pub fn is_lifetime_valid(
        &self,
        not_before: Option<TaggedDateTime>,
        expires: Option<TaggedDateTime>,
        now: DateTime<Utc>,
    ) -> bool {
        (self.lifetime_validator)(not_before, expires, now)
    }

    /// `jsonwebtoken` settings for signature, issuer and audience.
    ///
    /// Built-in `exp`/`nbf` checks are disabled; lifetime is decided by the
    /// policy's predicate instead.
    #[must_use]
    pub fn to_validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.required_spec_claims = HashSet::new();
        validation
    }

    /// Validate `token` and return its claims.
    ///
    /// Reads `clock` once, after the signature has been verified.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` with a generic message for every
    /// failure; the detail is logged at debug level.
    #[instrument(skip_all)]
    pub fn validate(&self, token: &str, clock: &dyn Clock) -> Result<Map<String, Value>, AuthError> {
        check_token_size(token).map_err(|_| invalid_token())?;

        let header = decode_header(token).map_err(|e| {
            tracing::debug!(target: "auth.validation", error = %e, "Token header is malformed");
            invalid_token()
        })?;
        if let (Some(token_kid), Some(key_kid)) = (header.kid.as_deref(), self.key.key_id()) {
            if token_kid != key_kid {
                tracing::debug!(
                    target: "auth.validation",
                    token_kid = %token_kid,
                    "Token signed with an unknown key"
                );
                return Err(invalid_token());
            }
        }

        let data = decode::<Map<String, Value>>(token, self.key.decoding_key(), &self.to_validation())
            .map_err(|e| {
                tracing::debug!(target: "auth.validation", error = %e, "Token verification failed");
                invalid_token()
            })?;

        let not_before = unix_claim(&data.claims, "nbf");
        let expires = unix_claim(&data.claims, "exp");
        if !self.is_lifetime_valid(not_before, expires, clock.now_utc()) {
            tracing::debug!(
                target: "auth.validation",
                nbf = ?not_before,
                exp = ?expires,
                "Token lifetime check failed"
            );
            return Err(invalid_token());
        }

        tracing::debug!(target: "auth.validation", "Token validated successfully");
        Ok(data.claims)
    }
}

impl fmt::Debug for ValidationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationPolicy")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

fn invalid_token() -> AuthError {
    AuthError::InvalidToken(INVALID_TOKEN_MESSAGE.to_string())
}

/// Numeric date claim as a UTC-flagged timestamp.
fn unix_claim(claims: &Map<String, Value>, name: &str) -> Option<TaggedDateTime> {
    claims
        .get(name)
        .and_then(Value::as_i64)
        .and_then(TaggedDateTime::from_unix_seconds)
}

//! Signed, time-boxed token issuance.
//!
//! [`TokenIssuer::generate`] turns a [`ClaimsIdentity`] into an RS256 JWT
//! carrying every identity claim plus `iss`, `aud`, `nbf`, `iat` and `exp`.
//! No network I/O happens here.

use crate::claims::ClaimsIdentity;
use crate::config::AuthConfig;
use crate::crypto::{build_security_key, SecurityKey};
use crate::errors::AuthError;
use crate::observability::metrics::record_token_issuance;
use crate::token::Token;
use chrono::{SubsecRound, TimeDelta};
use common::clock::{Clock, TaggedDateTime};
use common::secret::SecretString;
use jsonwebtoken::{encode, Algorithm, Header};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Lifetime used when the caller does not request one (1 hour).
pub const DEFAULT_TOKEN_LIFETIME: Duration = Duration::from_secs(3600);

/// Smallest RSA modulus accepted for signing.
pub const MIN_SIGNING_MODULUS_BITS: usize = 2048;

/// Issues signed bearer tokens with a fixed key, issuer and default audience.
pub struct TokenIssuer {
    key: Arc<SecurityKey>,
    issuer: String,
    audience: String,
    default_lifetime: Duration,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Create an issuer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` if the key cannot sign (public-only
    /// JWK or a modulus under [`MIN_SIGNING_MODULUS_BITS`]) or if the issuer
    /// or audience is empty.
    pub fn new(
        key: Arc<SecurityKey>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let issuer = issuer.into();
        let audience = audience.into();

        let modulus_bits = key.modulus_bits();
        if modulus_bits < MIN_SIGNING_MODULUS_BITS {
            return Err(AuthError::Configuration(format!(
                "Signing key modulus is {modulus_bits} bits, minimum is {MIN_SIGNING_MODULUS_BITS}"
            )));
        }
        if !key.has_private_key() {
            return Err(AuthError::Configuration(
                "Signing key has no private parameters".to_string(),
            ));
        }
        if issuer.is_empty() {
            return Err(AuthError::Configuration("Issuer is required".to_string()));
        }
        if audience.is_empty() {
            return Err(AuthError::Configuration("Audience is required".to_string()));
        }

        Ok(Self {
            key,
            issuer,
            audience,
            default_lifetime: DEFAULT_TOKEN_LIFETIME,
            clock,
        })
    }

    /// Build the signing key from configuration and create an issuer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` for any key or configuration problem.
    pub fn from_config(config: &AuthConfig, clock: Arc<dyn Clock>) -> Result<Self, AuthError> {
        let key = build_security_key(&config.signing_jwk)?;
        Ok(Self::new(Arc::new(key), config.issuer.clone(), config.audience.clone(), clock)?
            .with_default_lifetime(config.token_lifetime))
    }

    /// Override the default lifetime.
    #[must_use]
    pub fn with_default_lifetime(mut self, lifetime: Duration) -> Self {
        self.default_lifetime = lifetime;
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
    pub fn default_lifetime(&self) -> Duration {
        self.default_lifetime
    }

    #[must_use]
    pub fn key(&self) -> &Arc<SecurityKey> {
        &self.key
    }

    /// Issue a token for `identity`.
    ///
    /// `lifetime` defaults to the issuer's default lifetime; `audience`
    /// defaults to the configured audience. The returned token expires at
    /// issue time plus lifetime.
    ///
    /// # Errors
    ///
    /// - `AuthError::Configuration` - zero or out-of-range lifetime
    /// - `AuthError::Crypto` - signing failed
    #[instrument(skip_all)]
    pub fn generate(
        &self,
        identity: &ClaimsIdentity,
        lifetime: Option<Duration>,
        audience: Option<&str>,
    ) -> Result<Token, AuthError> {
        let start = Instant::now();
        let result = self.sign(identity, lifetime, audience);
        let status = if result.is_ok() { "success" } else { "error" };
        record_token_issuance(status, start.elapsed());

        match &result {
            Ok(token) => tracing::debug!(
                target: "auth.issuance",
                claim_count = identity.claims().len(),
                expires = %token.expires(),
                "Token issued"
            ),
            Err(e) => tracing::warn!(target: "auth.issuance", error = %e, "Token issuance failed"),
        }
        result
    }

    fn sign(
        &self,
        identity: &ClaimsIdentity,
        lifetime: Option<Duration>,
        audience: Option<&str>,
    ) -> Result<Token, AuthError> {
        let lifetime = lifetime.unwrap_or(self.default_lifetime);
        if lifetime.is_zero() {
            return Err(AuthError::Configuration(
                "Token lifetime must be positive".to_string(),
            ));
        }
        let lifetime = TimeDelta::from_std(lifetime)
            .map_err(|e| AuthError::Configuration(format!("Token lifetime out of range: {e}")))?;

        // Claims carry whole seconds, so the token's own expiry must too
        let issued_at = self.clock.now_utc().trunc_subsecs(0);
        let expires = issued_at
            .checked_add_signed(lifetime)
            .ok_or_else(|| AuthError::Configuration("Token lifetime out of range".to_string()))?;

        let audience = audience
            .filter(|a| !a.is_empty())
            .unwrap_or(&self.audience);

        let mut payload = identity.to_payload();
        payload.insert("iss".into(), Value::String(self.issuer.clone()));
        payload.insert("aud".into(), Value::String(audience.to_string()));
        payload.insert("nbf".into(), issued_at.timestamp().into());
        payload.insert("iat".into(), issued_at.timestamp().into());
        payload.insert("exp".into(), expires.timestamp().into());

        let encoding_key = self.key.encoding_key().ok_or_else(|| {
            AuthError::Configuration("Signing key has no private parameters".to_string())
        })?;

        let mut header = Header::new(Algorithm::RS256);
        header.typ = Some("JWT".to_string());
        header.kid = self.key.key_id().map(ToString::to_string);

        let value = encode(&header, &payload, encoding_key)
            .map_err(|e| AuthError::Crypto(format!("JWT signing operation failed: {e}")))?;

        Ok(Token::bearer(
            SecretString::from(value),
            TaggedDateTime::utc(expires),
        ))
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("key", &self.key)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("default_lifetime", &self.default_lifetime)
            .finish_non_exhaustive()
    }
}

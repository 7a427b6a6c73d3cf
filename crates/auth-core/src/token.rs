//! Immutable access token value object.
//!
//! A [`Token`] never caches whether it is expired: [`Token::is_expired`] reads
//! the injected clock once per call and compares against the normalized
//! expiry. A token whose expiry equals "now" is expired.

use common::clock::{Clock, TaggedDateTime};
use common::secret::{ExposeSecret, SecretString};
use std::fmt;

/// Token type of every token issued by this crate.
pub const BEARER_TOKEN_TYPE: &str = "Bearer";

/// An access token: type, opaque value and expiry instant.
#[derive(Clone)]
pub struct Token {
    token_type: String,
    value: SecretString,
    expires: TaggedDateTime,
}

impl Token {
    #[must_use]
    pub fn new(token_type: impl Into<String>, value: SecretString, expires: TaggedDateTime) -> Self {
        Self {
            token_type: token_type.into(),
            value,
            expires,
        }
    }

    /// Create a `Bearer` token.
    #[must_use]
    pub fn bearer(value: SecretString, expires: TaggedDateTime) -> Self {
        Self::new(BEARER_TOKEN_TYPE, value, expires)
    }

    #[must_use]
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// The opaque token value. Never log it.
    #[must_use]
    pub fn value(&self) -> &SecretString {
        &self.value
    }

    /// Expiry as supplied, with its kind flag.
    #[must_use]
    pub fn expires(&self) -> TaggedDateTime {
        self.expires
    }

    /// Whether the token is no longer usable.
    ///
    /// Reads `clock` exactly once.
    #[must_use]
    pub fn is_expired(&self, clock: &dyn Clock) -> bool {
        let now = clock.now_utc();
        self.expires.to_utc() <= now
    }

    /// `Authorization` header value, e.g. `Bearer eyJ...`.
    #[must_use]
    pub fn authorization_header(&self) -> SecretString {
        SecretString::from(format!(
            "{} {}",
            self.token_type,
            self.value.expose_secret()
        ))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("token_type", &self.token_type)
            .field("value", &"[REDACTED]")
            .field("expires", &self.expires)
            .finish()
    }
}

//! Reconstruction of RSA signing/verification keys from JWK material.
//!
//! [`SecurityKeyBuilder`] decodes a [`JsonWebKey`] once and can then build any
//! number of behaviorally equivalent [`SecurityKey`]s. The decoded material is
//! owned by the builder and released by [`SecurityKeyBuilder::dispose`], which
//! also runs on drop. Disposal is idempotent.
//!
//! Private members (`d`, `p`, `q`, `dp`, `dq`, `qi`) must be all present or all
//! absent. A key built from public members only can verify but not sign.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut builder = SecurityKeyBuilder::new(&jwk)?;
//! let key = builder.build()?;
//! builder.dispose();
//! builder.dispose(); // no-op
//! ```

use crate::crypto::jwk::{expose_member, JsonWebKey};
use crate::errors::AuthError;
use crate::observability::metrics::record_key_build;
use common::jwt::{decode_base64url_uint, encode_base64url_uint};
use common::secret::{ExposeSecret, SecretBox, SecretString};
use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::traits::PrivateKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use std::fmt;
use tracing::instrument;

/// Raw RSA key parameters, big-endian bytes.
pub struct RsaParameters {
    pub modulus: Vec<u8>,
    pub exponent: Vec<u8>,
    pub private: Option<RsaPrivateParameters>,
}

/// Private RSA parameters. Each field is zeroized on drop.
pub struct RsaPrivateParameters {
    pub d: SecretBox<Vec<u8>>,
    pub p: SecretBox<Vec<u8>>,
    pub q: SecretBox<Vec<u8>>,
    pub dp: SecretBox<Vec<u8>>,
    pub dq: SecretBox<Vec<u8>>,
    pub qi: SecretBox<Vec<u8>>,
}

fn clone_secret(value: &SecretBox<Vec<u8>>) -> SecretBox<Vec<u8>> {
    SecretBox::new(Box::new(value.expose_secret().clone()))
}

impl Clone for RsaPrivateParameters {
    fn clone(&self) -> Self {
        Self {
            d: clone_secret(&self.d),
            p: clone_secret(&self.p),
            q: clone_secret(&self.q),
            dp: clone_secret(&self.dp),
            dq: clone_secret(&self.dq),
            qi: clone_secret(&self.qi),
        }
    }
}

impl Clone for RsaParameters {
    fn clone(&self) -> Self {
        Self {
            modulus: self.modulus.clone(),
            exponent: self.exponent.clone(),
            private: self.private.clone(),
        }
    }
}

impl fmt::Debug for RsaPrivateParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaPrivateParameters")
            .field("d", &"[REDACTED]")
            .field("p", &"[REDACTED]")
            .field("q", &"[REDACTED]")
            .field("dp", &"[REDACTED]")
            .field("dq", &"[REDACTED]")
            .field("qi", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Debug for RsaParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RsaParameters")
            .field("modulus_bits", &(self.modulus.len() * 8))
            .field("exponent", &self.exponent)
            .field("private", &self.private)
            .finish()
    }
}

/// Decoded JWK material held by a builder between `new` and `dispose`.
struct KeyMaterial {
    key_id: Option<String>,
    parameters: RsaParameters,
}

/// RSA key usable for RS256 verification and, with private parameters, signing.
pub struct SecurityKey {
    key_id: Option<String>,
    parameters: RsaParameters,
    decoding_key: DecodingKey,
    encoding_key: Option<EncodingKey>,
}

impl SecurityKey {
    /// The JWK `kid`, if one was supplied.
    #[must_use]
    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    /// Whether this key carries private parameters and can sign.
    #[must_use]
    pub fn has_private_key(&self) -> bool {
        self.encoding_key.is_some()
    }

    /// Signing key, `None` for a verification-only key.
    #[must_use]
    pub fn encoding_key(&self) -> Option<&EncodingKey> {
        self.encoding_key.as_ref()
    }

    /// Verification key.
    #[must_use]
    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// Size of the modulus in bits, ignoring leading zero bytes.
    #[must_use]
    pub fn modulus_bits(&self) -> usize {
        BigUint::from_bytes_be(&self.parameters.modulus).bits()
    }

    /// Re-export the key's parameters.
    ///
    /// The exported bytes equal the decoded JWK members exactly. Private
    /// parameters are only included when `include_private` is set and the key
    /// has them.
    #[must_use]
    pub fn export_parameters(&self, include_private: bool) -> RsaParameters {
        RsaParameters {
            modulus: self.parameters.modulus.clone(),
            exponent: self.parameters.exponent.clone(),
            private: if include_private {
                self.parameters.private.clone()
            } else {
                None
            },
        }
    }

    /// Public JWK for this key, suitable for a JWKS document.
    #[must_use]
    pub fn to_public_jwk(&self) -> JsonWebKey {
        let mut jwk = JsonWebKey::rsa_public(
            encode_base64url_uint(&self.parameters.modulus),
            encode_base64url_uint(&self.parameters.exponent),
        );
        jwk.kid = self.key_id.clone();
        jwk.alg = Some("RS256".to_string());
        jwk.key_use = Some("sig".to_string());
        jwk
    }
}

impl fmt::Debug for SecurityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityKey")
            .field("key_id", &self.key_id)
            .field("modulus_bits", &(self.parameters.modulus.len() * 8))
            .field("has_private_key", &self.has_private_key())
            .finish_non_exhaustive()
    }
}

/// Builds [`SecurityKey`]s from a single decoded JWK.
pub struct SecurityKeyBuilder {
    material: Option<KeyMaterial>,
}

impl SecurityKeyBuilder {
    /// Decode and check a JWK.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Configuration` when the key type is not RSA, when the
    /// modulus or exponent is missing or not base64url, or when only some of
    /// the private members are present.
    #[instrument(skip_all)]
    pub fn new(jwk: &JsonWebKey) -> Result<Self, AuthError> {
        if jwk.kty != "RSA" {
            return Err(AuthError::Configuration(format!(
                "Unsupported JWK key type: {}",
                jwk.kty
            )));
        }

        let modulus = decode_required("n", jwk.n.as_deref())?;
        let exponent = decode_required("e", jwk.e.as_deref())?;

        let private = match jwk.private_member_count() {
            0 => None,
            6 => Some(decode_private(jwk)?),
            count => {
                let missing: Vec<&str> = jwk
                    .private_members()
                    .iter()
                    .filter(|(_, value)| value.is_none())
                    .map(|(name, _)| *name)
                    .collect();
                tracing::warn!(
                    target: "auth.crypto.key_builder",
                    present = count,
                    missing = ?missing,
                    "Rejected JWK with partial private key"
                );
                return Err(AuthError::Configuration(format!(
                    "Partial private key: missing {}",
                    missing.join(", ")
                )));
            }
        };

        Ok(Self {
            material: Some(KeyMaterial {
                key_id: jwk.kid.clone(),
                parameters: RsaParameters {
                    modulus,
                    exponent,
                    private,
                },
            }),
        })
    }

    /// Build a fresh key from the decoded material.
    ///
    /// # Errors
    ///
    /// - `AuthError::KeyDisposed` - the builder has been disposed
    /// - `AuthError::Configuration` - the numbers do not form a valid RSA key
    #[instrument(skip_all)]
    pub fn build(&self) -> Result<SecurityKey, AuthError> {
        let material = self.material.as_ref().ok_or(AuthError::KeyDisposed)?;
        let kind = if material.parameters.private.is_some() {
            "private"
        } else {
            "public"
        };

        match build_key(material) {
            Ok(key) => {
                tracing::debug!(
                    target: "auth.crypto.key_builder",
                    kid = ?key.key_id(),
                    has_private_key = key.has_private_key(),
                    "Security key built"
                );
                record_key_build(kind, "success");
                Ok(key)
            }
            Err(e) => {
                tracing::warn!(target: "auth.crypto.key_builder", error = %e, "Security key build failed");
                record_key_build(kind, "error");
                Err(e)
            }
        }
    }

    /// Release the decoded key material. Safe to call any number of times.
    pub fn dispose(&mut self) {
        if self.material.take().is_some() {
            tracing::trace!(target: "auth.crypto.key_builder", "Key material released");
        }
    }

    /// Whether [`dispose`](Self::dispose) has run.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.material.is_none()
    }
}

impl Drop for SecurityKeyBuilder {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for SecurityKeyBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityKeyBuilder")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

/// Build a single key from a JWK, releasing the builder afterwards.
///
/// # Errors
///
/// See [`SecurityKeyBuilder::new`] and [`SecurityKeyBuilder::build`].
pub fn build_security_key(jwk: &JsonWebKey) -> Result<SecurityKey, AuthError> {
    let builder = SecurityKeyBuilder::new(jwk)?;
    builder.build()
}

fn decode_required(name: &str, value: Option<&str>) -> Result<Vec<u8>, AuthError> {
    let value = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AuthError::Configuration(format!("JWK is missing '{name}'")))?;
    decode_member(name, value)
}

fn decode_member(name: &str, value: &str) -> Result<Vec<u8>, AuthError> {
    let bytes = decode_base64url_uint(value)
        .map_err(|e| AuthError::Configuration(format!("JWK member '{name}' is not base64url: {e}")))?;
    if bytes.is_empty() {
        return Err(AuthError::Configuration(format!("JWK member '{name}' is empty")));
    }
    Ok(bytes)
}

fn decode_secret(name: &str, value: Option<&SecretString>) -> Result<SecretBox<Vec<u8>>, AuthError> {
    let value = value.ok_or_else(|| AuthError::Configuration(format!("JWK is missing '{name}'")))?;
    decode_member(name, expose_member(value)).map(|bytes| SecretBox::new(Box::new(bytes)))
}

fn decode_private(jwk: &JsonWebKey) -> Result<RsaPrivateParameters, AuthError> {
    Ok(RsaPrivateParameters {
        d: decode_secret("d", jwk.d.as_ref())?,
        p: decode_secret("p", jwk.p.as_ref())?,
        q: decode_secret("q", jwk.q.as_ref())?,
        dp: decode_secret("dp", jwk.dp.as_ref())?,
        dq: decode_secret("dq", jwk.dq.as_ref())?,
        qi: decode_secret("qi", jwk.qi.as_ref())?,
    })
}

fn build_key(material: &KeyMaterial) -> Result<SecurityKey, AuthError> {
    let parameters = &material.parameters;
    let n = BigUint::from_bytes_be(&parameters.modulus);
    let e = BigUint::from_bytes_be(&parameters.exponent);

    // Range-checks the exponent and the upper modulus bound
    RsaPublicKey::new(n.clone(), e.clone())
        .map_err(|err| AuthError::Configuration(format!("Invalid RSA public key: {err}")))?;

    let decoding_key = DecodingKey::from_rsa_raw_components(&parameters.modulus, &parameters.exponent);

    let encoding_key = match &parameters.private {
        None => None,
        Some(private) => {
            let d = BigUint::from_bytes_be(private.d.expose_secret());
            let primes = vec![
                BigUint::from_bytes_be(private.p.expose_secret()),
                BigUint::from_bytes_be(private.q.expose_secret()),
            ];
            let mut private_key = RsaPrivateKey::from_components(n, e, d, primes)
                .map_err(|err| AuthError::Configuration(format!("Invalid RSA private key: {err}")))?;
            private_key
                .validate()
                .map_err(|err| AuthError::Configuration(format!("Invalid RSA private key: {err}")))?;
            private_key
                .precompute()
                .map_err(|err| AuthError::Configuration(format!("Invalid RSA private key: {err}")))?;
            check_crt_members(&private_key, private)?;
            let der = private_key
                .to_pkcs1_der()
                .map_err(|err| AuthError::Crypto(format!("PKCS#1 encoding failed: {err}")))?;
            Some(EncodingKey::from_rsa_der(der.as_bytes()))
        }
    };

    Ok(SecurityKey {
        key_id: material.key_id.clone(),
        parameters: parameters.clone(),
        decoding_key,
        encoding_key,
    })
}

/// The JWK's `dp`, `dq` and `qi` must match the values derived from `d`, `p` and `q`.
fn check_crt_members(
    private_key: &RsaPrivateKey,
    private: &RsaPrivateParameters,
) -> Result<(), AuthError> {
    let members = [
        ("dp", private_key.dp().cloned(), &private.dp),
        ("dq", private_key.dq().cloned(), &private.dq),
        ("qi", private_key.crt_coefficient(), &private.qi),
    ];
    for (name, derived, supplied) in members {
        if derived != Some(BigUint::from_bytes_be(supplied.expose_secret())) {
            tracing::warn!(
                target: "auth.crypto.key_builder",
                member = name,
                "Rejected JWK with inconsistent CRT member"
            );
            return Err(AuthError::Configuration(format!(
                "JWK member '{name}' does not match the private key"
            )));
        }
    }
    Ok(())
}

//! JSON Web Key input type (RFC 7517 / RFC 7518 RSA members).

use common::secret::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::fmt;

fn default_kty() -> String {
    "RSA".to_string()
}

/// RSA JSON Web Key.
///
/// Every numeric member is a base64url-encoded big-endian unsigned integer.
/// Private members are held as [`SecretString`] and redacted from `Debug`.
#[derive(Clone, Deserialize)]
pub struct JsonWebKey {
    /// Key type. Only `"RSA"` is accepted by the key builder.
    #[serde(default = "default_kty")]
    pub kty: String,

    /// Key ID, stamped into the header of tokens signed with this key.
    #[serde(default)]
    pub kid: Option<String>,

    #[serde(default)]
    pub alg: Option<String>,

    #[serde(default, rename = "use")]
    pub key_use: Option<String>,

    /// Modulus.
    #[serde(default)]
    pub n: Option<String>,

    /// Public exponent.
    #[serde(default)]
    pub e: Option<String>,

    /// Private exponent.
    #[serde(default)]
    pub d: Option<SecretString>,

    /// First prime factor.
    #[serde(default)]
    pub p: Option<SecretString>,

    /// Second prime factor.
    #[serde(default)]
    pub q: Option<SecretString>,

    /// First factor CRT exponent, `d mod (p - 1)`.
    #[serde(default)]
    pub dp: Option<SecretString>,

    /// Second factor CRT exponent, `d mod (q - 1)`.
    #[serde(default)]
    pub dq: Option<SecretString>,

    /// First CRT coefficient, `q^-1 mod p`.
    #[serde(default)]
    pub qi: Option<SecretString>,
}

impl JsonWebKey {
    /// Parse a JWK from its JSON text.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the text is not a JSON object with
    /// string members.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Create a public-only RSA key from base64url modulus and exponent.
    #[must_use]
    pub fn rsa_public(n: impl Into<String>, e: impl Into<String>) -> Self {
        Self {
            kty: default_kty(),
            kid: None,
            alg: None,
            key_use: None,
            n: Some(n.into()),
            e: Some(e.into()),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
        }
    }

    /// Private members in the order `d, p, q, dp, dq, qi`, as references.
    pub(crate) fn private_members(&self) -> [(&'static str, Option<&SecretString>); 6] {
        [
            ("d", self.d.as_ref()),
            ("p", self.p.as_ref()),
            ("q", self.q.as_ref()),
            ("dp", self.dp.as_ref()),
            ("dq", self.dq.as_ref()),
            ("qi", self.qi.as_ref()),
        ]
    }

    /// Number of private members present (0 for a public key, 6 for a full private key).
    #[must_use]
    pub fn private_member_count(&self) -> usize {
        self.private_members()
            .iter()
            .filter(|(_, value)| value.is_some())
            .count()
    }

    /// Copy of this key with every private member removed.
    #[must_use]
    pub fn to_public(&self) -> Self {
        Self {
            kty: self.kty.clone(),
            kid: self.kid.clone(),
            alg: self.alg.clone(),
            key_use: self.key_use.clone(),
            n: self.n.clone(),
            e: self.e.clone(),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
        }
    }

    /// Public members as a JWKS-style JSON object.
    #[must_use]
    pub fn public_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert("kty".into(), self.kty.clone().into());
        let optional = [
            ("kid", &self.kid),
            ("alg", &self.alg),
            ("use", &self.key_use),
            ("n", &self.n),
            ("e", &self.e),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                object.insert(name.into(), value.clone().into());
            }
        }
        serde_json::Value::Object(object)
    }
}

impl fmt::Debug for JsonWebKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<SecretString>| value.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("JsonWebKey")
            .field("kty", &self.kty)
            .field("kid", &self.kid)
            .field("alg", &self.alg)
            .field("use", &self.key_use)
            .field("n", &self.n)
            .field("e", &self.e)
            .field("d", &redact(&self.d))
            .field("p", &redact(&self.p))
            .field("q", &redact(&self.q))
            .field("dp", &redact(&self.dp))
            .field("dq", &redact(&self.dq))
            .field("qi", &redact(&self.qi))
            .finish()
    }
}

/// Expose a private member's text, for decoding.
pub(crate) fn expose_member(value: &SecretString) -> &str {
    value.expose_secret()
}

//! Key material handling: JWK input and RSA key reconstruction.

pub mod jwk;
pub mod key_builder;

pub use jwk::JsonWebKey;
pub use key_builder::{
    build_security_key, RsaParameters, RsaPrivateParameters, SecurityKey, SecurityKeyBuilder,
};

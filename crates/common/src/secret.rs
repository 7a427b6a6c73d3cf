//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use these types for
//! bearer token values, client secrets, and private key material.
//!
//! # Compile-Time Safety
//!
//! The key insight is that `SecretBox<T>` and `SecretString` implement `Debug`
//! with redaction, so any code that derives `Debug` on a struct containing secrets
//! will automatically get safe logging behavior. This makes it **impossible** to
//! accidentally log secrets via `{:?}` or tracing.
//!
//! # Memory Safety
//!
//! Secrets are automatically zeroized when dropped, preventing sensitive
//! data from lingering in memory after use.
//!
//! # Example
//!
//! ```rust
//! use common::secret::SecretString;
//! use secrecy::ExposeSecret;
//!
//! #[derive(Debug)]
//! struct BearerCredential {
//!     token_type: String,
//!     value: SecretString,  // Safe: Debug shows "[REDACTED]"
//! }
//!
//! let credential = BearerCredential {
//!     token_type: "Bearer".to_string(),
//!     value: SecretString::from("eyJhbGciOi..."),
//! };
//!
//! // This is safe - the token value is redacted
//! println!("{:?}", credential);
//!
//! // To access the actual value, you must explicitly call expose_secret()
//! let value: &str = credential.value.expose_secret();
//! ```
//!
//! # Usage Guidelines
//!
//! Use `SecretString` for:
//! - Bearer token values
//! - OAuth client secrets
//! - Base64url-encoded private JWK members (`d`, `p`, `q`, `dp`, `dq`, `qi`)
//!
//! Use `SecretBox<T>` for:
//! - Decoded binary key material (e.g., `SecretBox<Vec<u8>>`)
//!
//! # Serde Integration
//!
//! With the `serde` feature enabled, secrets can be deserialized from JSON:
//!
//! ```rust
//! use serde::Deserialize;
//! use common::secret::SecretString;
//!
//! #[derive(Debug, Deserialize)]
//! struct GatewayCredentials {
//!     client_id: String,
//!     client_secret: SecretString,
//! }
//!
//! let json = r#"{"client_id": "ledger-api", "client_secret": "secret-key"}"#;
//! let creds: GatewayCredentials = serde_json::from_str(json).unwrap();
//!
//! // Debug output is safe
//! println!("{:?}", creds);
//! // client_id is visible, client_secret is redacted
//! ```

// Re-export the main types from secrecy
pub use secrecy::{ExposeSecret, SecretBox, SecretString};

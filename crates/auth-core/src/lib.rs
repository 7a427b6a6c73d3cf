//! Ledgerline security core
//!
//! Token issuance, signing-key reconstruction from JWK material, the
//! validation policy handed to token consumers, and cached single-flight
//! acquisition of delegated access tokens.
//!
//! # Modules
//!
//! - `config` - Environment-driven configuration
//! - `crypto` - JWK input and RSA key reconstruction
//! - `claims` - Claims identity and its JWT payload projection
//! - `token` - Bearer token value object
//! - `issuance` - Token signing
//! - `validation` - Validation policy and lifetime predicate
//! - `context` - Security context cache and provider
//! - `gateway_http` - Client-credentials gateway over HTTP
//! - `errors` - Error types
//! - `observability` - Metrics and log-field helpers

pub mod claims;
pub mod config;
pub mod context;
pub mod crypto;
pub mod errors;
pub mod gateway_http;
pub mod issuance;
pub mod observability;
pub mod token;
pub mod validation;

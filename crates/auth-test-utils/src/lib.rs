//! # Auth Test Utilities
//!
//! Shared test utilities for the security core.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (two fixed 2048-bit RSA signing keys)
//! - A controllable clock (`MockClock`)
//! - A scriptable security gateway (`MockSecurityGateway`)
//! - Test data builders (`TestIdentityBuilder`)
//! - Fixed test IDs (issuer, audience, principal)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use auth_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let clock = Arc::new(MockClock::new());
//!     let issuer = test_token_issuer(1, clock.clone())?;
//!
//!     let token = issuer.generate(&TestIdentityBuilder::new().build(), None, None)?;
//!     clock.advance_secs(3600);
//!     assert!(token.is_expired(clock.as_ref()));
//! }
//! ```

pub mod crypto_fixtures;
pub mod identity_builders;
pub mod mock_clock;
pub mod mock_gateway;
pub mod test_ids;

// Re-export commonly used items
pub use crypto_fixtures::*;
pub use identity_builders::*;
pub use mock_clock::*;
pub use mock_gateway::*;
pub use test_ids::*;

//! Common utilities and types shared across the Ledgerline security crates.

#![warn(clippy::pedantic)]

/// Module for the injectable time source and kind-flagged timestamps
pub mod clock;

/// Module for secret types that prevent accidental logging
pub mod secret;

/// Module for JWT utilities (size limits, header inspection, base64url integers)
pub mod jwt;

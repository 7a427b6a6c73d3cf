//! Observability for the security core.
//!
//! Metrics are recorded through the `metrics` facade; the host installs the
//! exporter. Log fields follow three categories:
//! - **SAFE**: plain text (outcomes, key ids, durations)
//! - **HASHED**: SHA-256 prefix for correlation (principal names)
//! - **NEVER**: bearer values, private key members, client secrets

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// This is a one-way hash for correlating log lines, not a secret-protection
/// mechanism.
#[must_use]
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    hex::encode(digest.get(..4).unwrap_or_default())
}

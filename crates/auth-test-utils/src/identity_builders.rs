//! Builder patterns for test identities

use crate::test_ids::TEST_SUBJECT_ALICE;
use auth_core::claims::{Claim, ClaimsIdentity};

/// Builder for creating test claims identities
///
/// # Example
/// ```rust,ignore
/// let identity = TestIdentityBuilder::new()
///     .for_subject("bob@ledgerline.test")
///     .with_role("auditor")
///     .with_claim("tenant", "acme")
///     .build();
/// ```
pub struct TestIdentityBuilder {
    subject: Option<String>,
    claims: Vec<Claim>,
}

impl TestIdentityBuilder {
    /// Create a new builder for [`TEST_SUBJECT_ALICE`] with no other claims
    pub fn new() -> Self {
        Self {
            subject: Some(TEST_SUBJECT_ALICE.to_string()),
            claims: Vec::new(),
        }
    }

    /// Set the subject
    pub fn for_subject(mut self, subject: &str) -> Self {
        self.subject = Some(subject.to_string());
        self
    }

    /// Omit the `sub` claim entirely
    pub fn without_subject(mut self) -> Self {
        self.subject = None;
        self
    }

    /// Add a `role` claim (repeatable)
    pub fn with_role(self, role: &str) -> Self {
        self.with_claim("role", role)
    }

    /// Add an arbitrary claim
    pub fn with_claim(mut self, name: &str, value: &str) -> Self {
        self.claims.push(Claim::new(name, value));
        self
    }

    /// Build the identity: `sub` first, then claims in insertion order
    pub fn build(self) -> ClaimsIdentity {
        let mut identity = match self.subject {
            Some(subject) => ClaimsIdentity::for_subject(subject),
            None => ClaimsIdentity::new(),
        };
        for claim in self.claims {
            identity.add_claim(claim);
        }
        identity
    }
}

impl Default for TestIdentityBuilder {
    fn default() -> Self {
        Self::new()
    }
}

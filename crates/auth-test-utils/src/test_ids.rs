//! Fixed test IDs for deterministic tests

// Token issuance
pub const TEST_ISSUER: &str = "https://auth.ledgerline.test";
pub const TEST_AUDIENCE: &str = "ledger-api";
pub const TEST_OTHER_AUDIENCE: &str = "contacts-api";

// Signing Key IDs (match the fixture JWKs)
pub const TEST_KEY_ID_1: &str = "test-signing-key-01";
pub const TEST_KEY_ID_2: &str = "test-signing-key-02";

// Subjects and principals
pub const TEST_SUBJECT_ALICE: &str = "alice@ledgerline.test";
pub const TEST_SUBJECT_BOB: &str = "bob@ledgerline.test";
pub const TEST_PRINCIPAL: &str = "reporting-service";

// Roles
pub const ROLE_ACCOUNTANT: &str = "accountant";
pub const ROLE_AUDITOR: &str = "auditor";

/// 2024-01-15 12:00:00 UTC. Mid-January noon: never a DST transition.
pub const TEST_INSTANT_UNIX: i64 = 1_705_320_000;

//! Claims identity: an ordered set of name/value assertions about a principal.

use serde_json::{Map, Value};

/// Claim names the token issuer controls. Identity claims with these names
/// are not copied into issued tokens.
pub const RESERVED_CLAIM_NAMES: [&str; 5] = ["iss", "aud", "exp", "nbf", "iat"];

/// Subject claim name.
pub const SUBJECT_CLAIM: &str = "sub";

/// A single name/value assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    pub name: String,
    pub value: String,
}

impl Claim {
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Ordered claims about a principal. Names may repeat (e.g. several `role`s).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimsIdentity {
    claims: Vec<Claim>,
}

impl ClaimsIdentity {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity with a single `sub` claim.
    #[must_use]
    pub fn for_subject(subject: impl Into<String>) -> Self {
        Self::new().with_claim(SUBJECT_CLAIM, subject)
    }

    /// Append a claim (builder style).
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_claim(Claim::new(name, value));
        self
    }

    pub fn add_claim(&mut self, claim: Claim) {
        self.claims.push(claim);
    }

    #[must_use]
    pub fn claims(&self) -> &[Claim] {
        &self.claims
    }

    /// First value for `name`, in insertion order.
    #[must_use]
    pub fn find_first(&self, name: &str) -> Option<&str> {
        self.claims
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// All values for `name`, in insertion order.
    pub fn find_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.claims
            .iter()
            .filter(move |c| c.name == name)
            .map(|c| c.value.as_str())
    }

    /// The `sub` claim, if present.
    #[must_use]
    pub fn subject(&self) -> Option<&str> {
        self.find_first(SUBJECT_CLAIM)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }

    /// JWT payload projection.
    ///
    /// A name seen once maps to a string; a repeated name maps to an array of
    /// its values in order. Names appear in first-seen order. Reserved names
    /// are skipped.
    #[must_use]
    pub fn to_payload(&self) -> Map<String, Value> {
        let mut payload = Map::new();
        for claim in &self.claims {
            if RESERVED_CLAIM_NAMES.contains(&claim.name.as_str()) {
                continue;
            }
            let value = Value::String(claim.value.clone());
            match payload.get_mut(&claim.name) {
                None => {
                    payload.insert(claim.name.clone(), value);
                }
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }
        payload
    }

    /// Rebuild an identity from a decoded JWT payload.
    ///
    /// Arrays expand to repeated claims; numbers and booleans are rendered as
    /// text; nested objects are kept as their JSON text.
    #[must_use]
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        let mut identity = Self::new();
        for (name, value) in payload {
            match value {
                Value::Array(values) => {
                    for item in values {
                        identity.add_claim(Claim::new(name.clone(), value_text(item)));
                    }
                }
                Value::Null => {}
                other => identity.add_claim(Claim::new(name.clone(), value_text(other))),
            }
        }
        identity
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

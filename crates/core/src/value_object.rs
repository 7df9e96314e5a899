//! Value objects: equality by value, not identity.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one,
/// build a new one.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A normalized (trimmed, lower-cased) email address.
///
/// Email is the unique login key for accounts, so normalization happens once
/// here and every comparison works on the normalized form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl ValueObject for Email {}

impl Email {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let normalized = raw.trim().to_lowercase();
        if !looks_like_email(&normalized) {
            return Err(DomainError::validation("email is not valid"));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn looks_like_email(s: &str) -> bool {
    if s.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // Require a dot-separated domain with no empty labels.
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}

impl FromStr for Email {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Email {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

impl core::fmt::Display for Email {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        let email = Email::parse("  A@X.org ").unwrap();
        assert_eq!(email.as_str(), "a@x.org");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for raw in ["", "plain", "@x.org", "a@", "a@x", "a@@x.org", "a b@x.org", "a@x..org"] {
            assert!(Email::parse(raw).is_err(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<Email, _> = serde_json::from_str("\"Field@Agency.org\"");
        assert_eq!(ok.unwrap().as_str(), "field@agency.org");

        let bad: Result<Email, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn equal_up_to_case(local in "[a-z]{1,12}", domain in "[a-z]{1,12}") {
            let lower = Email::parse(&format!("{local}@{domain}.org")).unwrap();
            let upper = Email::parse(&format!("{}@{}.ORG", local.to_uppercase(), domain)).unwrap();
            prop_assert_eq!(lower, upper);
        }
    }
}

//! Addressable-entity abstraction for the interaction log and relationship
//! cache.
//!
//! An interaction or relationship endpoint is one of three things: an
//! onboarded investor (addressed by row id), a not-yet-onboarded candidate
//! (addressed by its stable identity key), or an organization (addressed by
//! a synthetic key such as `company:42`). The tagged union keeps the three
//! cases exhaustive; the (entity_type, entity_id, entity_key) column triple
//! exists only at the SQL boundary.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_name;

/// One endpoint of an interaction or relationship.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "ref", rename_all = "snake_case")]
pub enum EntityRef {
    /// An onboarded investor, by `investors.id`.
    Investor(i64),
    /// A not-yet-onboarded candidate, by identity key
    /// (`normalized_name|lowercase_linkedin_url`).
    Candidate(String),
    /// An organization, by synthetic key (lowercase org name or
    /// `company:{id}` for the company itself).
    Org(String),
}

impl EntityRef {
    /// Candidate reference from a display name and LinkedIn URL.
    pub fn candidate(name: &str, linkedin_url: &str) -> Self {
        EntityRef::Candidate(candidate_key(name, linkedin_url))
    }

    /// String label for the `entity_type` / `from_type` / `to_type` columns.
    pub fn type_str(&self) -> &'static str {
        match self {
            EntityRef::Investor(_) => "investor",
            EntityRef::Candidate(_) => "candidate",
            EntityRef::Org(_) => "org",
        }
    }

    /// Value for the `entity_id` column (investors only).
    pub fn id(&self) -> Option<i64> {
        match self {
            EntityRef::Investor(id) => Some(*id),
            _ => None,
        }
    }

    /// Value for the `entity_key` column (candidates and orgs).
    pub fn key(&self) -> Option<&str> {
        match self {
            EntityRef::Investor(_) => None,
            EntityRef::Candidate(k) | EntityRef::Org(k) => Some(k.as_str()),
        }
    }
}

/// Stable identity key for a candidate: normalized name plus lowercased
/// LinkedIn URL. Stable across pipeline runs so repeated imports of the
/// same person merge.
pub fn candidate_key(name: &str, linkedin_url: &str) -> String {
    format!(
        "{}|{}",
        normalize_name(name),
        linkedin_url.trim().to_lowercase()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_key_stable_across_variants() {
        let a = candidate_key("Jane M. Doe", "https://linkedin.com/in/janedoe");
        let b = candidate_key("jane doe", "HTTPS://LINKEDIN.COM/IN/JANEDOE");
        assert_eq!(a, b);
        assert_eq!(a, "janedoe|https://linkedin.com/in/janedoe");
    }

    #[test]
    fn test_entity_ref_columns() {
        let inv = EntityRef::Investor(7);
        assert_eq!(inv.type_str(), "investor");
        assert_eq!(inv.id(), Some(7));
        assert_eq!(inv.key(), None);

        let cand = EntityRef::candidate("Jane Doe", "");
        assert_eq!(cand.type_str(), "candidate");
        assert_eq!(cand.id(), None);
        assert_eq!(cand.key(), Some("janedoe|"));

        let org = EntityRef::Org("company:3".into());
        assert_eq!(org.type_str(), "org");
        assert_eq!(org.key(), Some("company:3"));
    }
}

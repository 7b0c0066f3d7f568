//! User records and lookup results.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

/// Storage key prefix under which user records live.
pub const USER_STORAGE_PREFIX: &str = "user/";

/// Build the storage key for a user name.
pub fn user_key(name: &str) -> String {
    format!("{}{}", USER_STORAGE_PREFIX, name)
}

/// Policies associated with a single user.
///
/// The user name is not part of the value; it is implied by the storage key.
/// Policies are kept in a `BTreeSet` so the persisted form is sorted and
/// free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Policy names granted to the user.
    #[serde(rename = "Policies", default, deserialize_with = "null_as_empty")]
    pub policies: BTreeSet<String>,
}

impl UserEntry {
    /// Create an entry from an already-normalized policy set.
    pub fn new(policies: BTreeSet<String>) -> Self {
        Self { policies }
    }

    /// Whether the entry grants no policies.
    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    /// Policies as an owned, sorted list.
    pub fn policy_list(&self) -> Vec<String> {
        self.policies.iter().cloned().collect()
    }
}

// Older writers persisted an unset list as `null`.
fn null_as_empty<'de, D>(deserializer: D) -> Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<BTreeSet<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Result of looking up a user record.
///
/// Keeps "no record" apart from "record with no policies".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserLookup {
    /// No record is stored under the name.
    NotFound,
    /// A record exists but grants no policies.
    Empty,
    /// A record exists with at least one policy.
    Found(UserEntry),
}

impl UserLookup {
    /// Classify a decoded entry.
    pub fn from_entry(entry: UserEntry) -> Self {
        if entry.is_empty() {
            Self::Empty
        } else {
            Self::Found(entry)
        }
    }

    /// Whether a record exists.
    pub fn exists(&self) -> bool {
        !matches!(self, Self::NotFound)
    }

    /// The stored entry, if one exists. `Empty` yields a default entry.
    pub fn into_entry(self) -> Option<UserEntry> {
        match self {
            Self::NotFound => None,
            Self::Empty => Some(UserEntry::default()),
            Self::Found(entry) => Some(entry),
        }
    }
}

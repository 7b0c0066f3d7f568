//! Policy list normalization.
//!
//! ## Rules
//!
//! 1. Entries are trimmed and lowercased.
//! 2. Empty entries are dropped.
//! 3. Names may only contain ASCII alphanumerics, `-`, `_`, `.` and `/`,
//!    and may not start with `/`.
//! 4. `root` is reserved and cannot be granted through a user mapping.
//! 5. The result is deduplicated and sorted.

use std::collections::BTreeSet;

/// Policy name that can never be attached to a user.
pub const RESERVED_ROOT_POLICY: &str = "root";

/// Error type for policy parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyError {
    /// Name contains a character outside the allowed set.
    #[error("invalid policy name {name:?}: unexpected character {found:?}")]
    InvalidCharacter {
        /// The offending (normalized) name.
        name: String,
        /// First disallowed character.
        found: char,
    },
    /// Name starts with a path separator.
    #[error("invalid policy name {0:?}: must not start with '/'")]
    LeadingSlash(String),
    /// Name is reserved.
    #[error("policy {0:?} is reserved and cannot be assigned to a user")]
    Reserved(String),
}

/// Parse a comma-separated policy list.
///
/// An empty string yields an empty set.
pub fn parse_policy_list(raw: &str) -> Result<BTreeSet<String>, PolicyError> {
    parse_policies(raw.split(','))
}

/// Normalize a sequence of policy names into a sorted, deduplicated set.
pub fn parse_policies<I, S>(items: I) -> Result<BTreeSet<String>, PolicyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut policies = BTreeSet::new();

    for item in items {
        let name = item.as_ref().trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        validate_policy_name(&name)?;
        policies.insert(name);
    }

    Ok(policies)
}

/// Check a single, already-normalized policy name.
pub fn validate_policy_name(name: &str) -> Result<(), PolicyError> {
    if name == RESERVED_ROOT_POLICY {
        return Err(PolicyError::Reserved(name.to_string()));
    }
    if name.starts_with('/') {
        return Err(PolicyError::LeadingSlash(name.to_string()));
    }
    if let Some(found) = name.chars().find(|c| !is_policy_char(*c)) {
        return Err(PolicyError::InvalidCharacter {
            name: name.to_string(),
            found,
        });
    }
    Ok(())
}

fn is_policy_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/')
}

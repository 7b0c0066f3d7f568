//! # user-policy-store
//!
//! User-to-policy mappings for a pluggable authentication backend.
//!
//! A user record maps a user name to a set of policy names. Records live in
//! an injected key-value store under `user/<name>`, and are managed through
//! four routed operations: list, read, update and delete.
//!
//! ## Architecture
//!
//! ```text
//! Request → Backend (path table) → handler → Storage (memory or Postgres)
//!                                     ↓
//!                           policy parser + JSON codec
//! ```
//!
//! ## Guarantees
//!
//! - Each handler performs exactly one storage call
//! - Writes replace the previous record, never merge
//! - A missing user reads as "not found", distinct from a user with no policies
//! - Listing is sorted by name

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod codec;
pub mod policy;
pub mod store;
pub mod types;

// Re-exports
pub use backend::{
    get_user, Backend, BackendError, Operation, Request, RequestContext, Response,
    USER_PATH_PREFIX,
};
pub use codec::{decode_entry, encode_entry, CodecError};
pub use policy::{parse_policies, parse_policy_list, PolicyError};
pub use store::{InMemoryStorage, Storage, StorageEntry};
#[cfg(feature = "postgres")]
pub use store::{PostgresConfig, PostgresStorage};
pub use types::{user_key, UserEntry, UserLookup, USER_STORAGE_PREFIX};

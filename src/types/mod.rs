//! Core types for the user policy store.

pub mod user;

pub use user::{user_key, UserEntry, UserLookup, USER_STORAGE_PREFIX};

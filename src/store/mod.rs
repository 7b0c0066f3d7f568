//! Key-value storage backends.

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

use async_trait::async_trait;

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEntry {
    /// Full storage key.
    pub key: String,
    /// Raw value bytes.
    pub value: Vec<u8>,
}

impl StorageEntry {
    /// Create a new entry.
    pub fn new(key: impl Into<String>, value: Vec<u8>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Trait for key-value storage backends.
///
/// Atomicity of each call is up to the implementation; callers never
/// combine calls into a read-modify-write.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Error type for store operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch an entry by key. `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, Self::Error>;

    /// Insert or replace an entry.
    async fn put(&self, entry: StorageEntry) -> Result<(), Self::Error>;

    /// Remove a key. Removing an absent key succeeds.
    async fn delete(&self, key: &str) -> Result<(), Self::Error>;

    /// List full keys starting with `prefix`, ordered by key.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, Self::Error>;
}

pub use memory::{InMemoryError, InMemoryStorage};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresError, PostgresStorage};

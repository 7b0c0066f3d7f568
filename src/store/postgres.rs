//! PostgreSQL storage for production use.
//!
//! ## Configuration
//!
//! All settings can be configured via environment variables:
//! - `DATABASE_URL`: PostgreSQL connection string (required)
//! - `DB_MAX_CONNECTIONS`: Maximum pool size (default: 10)
//! - `DB_MIN_CONNECTIONS`: Minimum idle connections (default: 2)
//! - `DB_CONNECT_TIMEOUT_SECS`: Connection timeout (default: 10)
//! - `DB_IDLE_TIMEOUT_SECS`: Idle connection timeout (default: 300)
//! - `DB_MAX_LIFETIME_SECS`: Max connection lifetime (default: 1800)
//!
//! ## Schema
//!
//! ```sql
//! CREATE TABLE user_policy_entries (
//!     key   TEXT PRIMARY KEY,
//!     value BYTEA NOT NULL
//! );
//! ```

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use std::time::Duration;

use super::{Storage, StorageEntry};

/// Table holding every stored entry.
pub const ENTRIES_TABLE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS user_policy_entries (
    key   TEXT PRIMARY KEY,
    value BYTEA NOT NULL
)
"#;

/// Connection settings for the entries database.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// `DATABASE_URL`.
    pub database_url: String,
    /// Pool ceiling.
    pub max_connections: u32,
    /// Connections kept open while idle.
    pub min_connections: u32,
    /// Seconds to wait when acquiring a connection.
    pub connect_timeout_secs: u64,
    /// Seconds before an idle connection is closed.
    pub idle_timeout_secs: u64,
    /// Seconds before any connection is recycled.
    pub max_lifetime_secs: u64,
}

impl PostgresConfig {
    /// Read settings from the environment, falling back to the defaults in the module docs.
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/policies".to_string()),
            max_connections: env_or("DB_MAX_CONNECTIONS", 10),
            min_connections: env_or("DB_MIN_CONNECTIONS", 2),
            connect_timeout_secs: env_or("DB_CONNECT_TIMEOUT_SECS", 10),
            idle_timeout_secs: env_or("DB_IDLE_TIMEOUT_SECS", 300),
            max_lifetime_secs: env_or("DB_MAX_LIFETIME_SECS", 1800),
        }
    }

    /// Override the connection URL.
    pub fn with_database_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = database_url.into();
        self
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Error type for PostgreSQL store.
#[derive(Debug, thiserror::Error)]
pub enum PostgresError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// PostgreSQL key-value store.
///
/// Every entry is one row in `user_policy_entries`.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Create a new store with the given configuration.
    pub async fn new(config: PostgresConfig) -> Result<Self, PostgresError> {
        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            connect_timeout_secs = config.connect_timeout_secs,
            idle_timeout_secs = config.idle_timeout_secs,
            max_lifetime_secs = config.max_lifetime_secs,
            "Initializing PostgreSQL connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
            .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
            .test_before_acquire(true)
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Create the entries table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), PostgresError> {
        sqlx::query(ENTRIES_TABLE_SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

/// Escape `LIKE` metacharacters so a prefix matches literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl Storage for PostgresStorage {
    type Error = PostgresError;

    async fn get(&self, key: &str) -> Result<Option<StorageEntry>, Self::Error> {
        let row = sqlx::query(
            r#"
            SELECT key, value
            FROM user_policy_entries
            WHERE key = $1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(StorageEntry::new(
                r.try_get::<String, _>("key")?,
                r.try_get::<Vec<u8>, _>("value")?,
            ))),
            None => Ok(None),
        }
    }

    async fn put(&self, entry: StorageEntry) -> Result<(), Self::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_policy_entries (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(&entry.key)
        .bind(&entry.value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Self::Error> {
        sqlx::query("DELETE FROM user_policy_entries WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, Self::Error> {
        let rows = sqlx::query(
            r#"
            SELECT key
            FROM user_policy_entries
            WHERE key LIKE $1 ESCAPE '\'
            ORDER BY key
            "#,
        )
        .bind(like_prefix(prefix))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("key"))
            .collect::<Result<Vec<_>, _>>()
            .map_err(PostgresError::from)
    }
}

//! # atlas-db
//!
//! PostgreSQL persistence using SQLx:
//!
//! - Connection pool management
//! - `PgContentStore` and `PgAssetLedger`, the production implementations
//!   of the content-store and asset-ledger traits
//! - The user repository used by auth, ownership and billing
//!
//! Schema lives in `migrations/`.

pub mod content;
pub mod ledger;
pub mod pool;
pub mod users;

pub use content::PgContentStore;
pub use ledger::PgAssetLedger;
pub use pool::{Database, DatabaseConfig, PoolStats};
pub use users::{CreateUserDto, UpdateUserDto, UserRepository, UserRow};

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Postgres error code for foreign-key violations.
pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";

pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION)
        }
        _ => false,
    }
}

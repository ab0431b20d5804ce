//! # Newsdesk DB
//!
//! Database pool and the persistent stores behind the authorization pipeline.
//!
//! - [`store`]: the [`UserStore`] and [`RoleStore`] traits and [`StoreError`]
//! - [`postgres`]: [`PgStore`], the sqlx-backed implementation
//! - [`memory`]: [`MemoryStore`], an in-process implementation for tests and local runs
//!
//! # Example
//!
//! ```ignore
//! use newsdesk_db::{init_db_pool, PgStore};
//!
//! let pool = init_db_pool(&database_url).await?;
//! let store = Arc::new(PgStore::new(pool));
//! ```

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod postgres;
pub mod store;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{RoleStore, StoreError, StoreResult, UserStore};

// Re-export PgPool for convenience
pub use sqlx::PgPool;

/// Initializes a PostgreSQL connection pool.
///
/// The pool is cheaply cloneable and should be created once at startup.
///
/// # Errors
///
/// Returns the connection error if the database is unreachable within the
/// acquire timeout.
pub async fn init_db_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

//! # Newsdesk Cache
//!
//! Process-local cache of role → permission lists.
//!
//! Entries are served while younger than the configured TTL and refetched
//! from the [`RoleStore`](newsdesk_db::RoleStore) afterwards. Concurrent
//! misses for one role share a single store query.
//!
//! # Example
//!
//! ```ignore
//! use newsdesk_cache::{CacheConfig, PermissionCache};
//!
//! let cache = PermissionCache::new(role_store, clock, &CacheConfig::from_env());
//! let resolved = cache.resolve("editor").await?;
//! if resolved.grants.allows("news.create") { /* ... */ }
//! ```

pub mod config;
pub mod permissions;

pub use config::CacheConfig;
pub use permissions::{CacheError, CacheOutcome, PermissionCache, Resolved};

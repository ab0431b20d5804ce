//! Time-boxed, single-flight role permission cache.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use newsdesk_core::Clock;
use newsdesk_core::permissions::SUPER_ADMIN_ROLE;
use newsdesk_db::{RoleStore, StoreError};
use newsdesk_models::Grants;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::config::CacheConfig;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("role store lookup failed: {0}")]
    Store(#[from] StoreError),
}

/// How a lookup was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Super-admin role; neither cache nor store consulted.
    Bypass,
    Hit,
    Miss,
}

impl CacheOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheOutcome::Bypass => "bypass",
            CacheOutcome::Hit => "hit",
            CacheOutcome::Miss => "miss",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Resolved {
    pub grants: Grants,
    pub outcome: CacheOutcome,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    grants: Grants,
    fetched_at: DateTime<Utc>,
}

pub struct PermissionCache {
    store: Arc<dyn RoleStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    entries: DashMap<String, CacheEntry>,
    refresh_locks: DashMap<String, Arc<Mutex<()>>>,
    /// Bumped on every invalidation; a fetch that started under an older
    /// epoch does not populate the cache.
    epoch: AtomicU64,
}

impl fmt::Debug for PermissionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PermissionCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl PermissionCache {
    pub fn new(store: Arc<dyn RoleStore>, clock: Arc<dyn Clock>, config: &CacheConfig) -> Self {
        Self {
            store,
            clock,
            ttl: config.ttl(),
            entries: DashMap::new(),
            refresh_locks: DashMap::new(),
            epoch: AtomicU64::new(0),
        }
    }

    /// Returns the grants for `role`.
    ///
    /// The super-admin role short-circuits to [`Grants::Full`]. Otherwise a
    /// fresh entry is served from memory and a stale or missing one is
    /// refetched. An unknown role resolves to an empty list, which is cached
    /// like any other.
    ///
    /// # Errors
    ///
    /// [`CacheError::Store`] if the role store fails; nothing is cached.
    #[instrument(skip(self))]
    pub async fn resolve(&self, role: &str) -> Result<Resolved, CacheError> {
        if role == SUPER_ADMIN_ROLE {
            return Ok(Resolved {
                grants: Grants::Full,
                outcome: CacheOutcome::Bypass,
            });
        }

        if let Some(grants) = self.fresh(role) {
            debug!(role, "permission cache hit");
            return Ok(Resolved {
                grants,
                outcome: CacheOutcome::Hit,
            });
        }

        let lock = self
            .refresh_locks
            .entry(role.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another waiter may have refreshed while we queued.
        if let Some(grants) = self.fresh(role) {
            debug!(role, "permission cache filled by concurrent refresh");
            return Ok(Resolved {
                grants,
                outcome: CacheOutcome::Hit,
            });
        }

        let epoch = self.epoch.load(Ordering::Acquire);
        let permissions = self.store.permissions_for_role(role).await?;
        let grants = Grants::listed(permissions.unwrap_or_default());

        if self.epoch.load(Ordering::Acquire) == epoch {
            self.entries.insert(
                role.to_string(),
                CacheEntry {
                    grants: grants.clone(),
                    fetched_at: self.clock.now(),
                },
            );
        }
        debug!(role, "permission cache refreshed");

        Ok(Resolved {
            grants,
            outcome: CacheOutcome::Miss,
        })
    }

    fn fresh(&self, role: &str) -> Option<Grants> {
        let entry = self.entries.get(role)?;
        let age = self.clock.now() - entry.fetched_at;
        (age <= self.ttl).then(|| entry.grants.clone())
    }

    /// Drops the entry for one role so the next lookup refetches it.
    pub fn invalidate(&self, role: &str) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.entries.remove(role);
    }

    /// Drops every entry.
    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use newsdesk_core::ManualClock;
    use newsdesk_db::MemoryStore;

    async fn setup() -> (Arc<PermissionCache>, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        store
            .set_permissions(
                "editor",
                &["news.create".to_string(), "news.update".to_string()],
                None,
            )
            .await
            .unwrap();
        let clock = ManualClock::default();
        let cache = PermissionCache::new(
            Arc::new(store.clone()),
            Arc::new(clock.clone()),
            &CacheConfig { ttl_seconds: 300 },
        );
        (Arc::new(cache), store, clock)
    }

    #[tokio::test]
    async fn test_admin_bypasses_cache_and_store() {
        let (cache, store, _) = setup().await;
        let resolved = cache.resolve("admin").await.unwrap();

        assert_eq!(resolved.outcome, CacheOutcome::Bypass);
        assert!(resolved.grants.allows("news.delete"));
        assert_eq!(store.role_queries(), 0);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_two_lookups_within_ttl_query_once() {
        let (cache, store, clock) = setup().await;

        assert_eq!(cache.resolve("editor").await.unwrap().outcome, CacheOutcome::Miss);
        clock.advance(Duration::seconds(100));
        assert_eq!(cache.resolve("editor").await.unwrap().outcome, CacheOutcome::Hit);
        assert_eq!(store.role_queries(), 1);
    }

    #[tokio::test]
    async fn test_editor_refreshed_after_ttl() {
        let (cache, store, clock) = setup().await;

        // t=0
        let grants = cache.resolve("editor").await.unwrap().grants;
        assert!(grants.allows("news.create"));

        // The store changes, but the cached list still applies until expiry.
        store
            .set_permissions(
                "editor",
                &["news.create".to_string(), "news.delete".to_string()],
                None,
            )
            .await
            .unwrap();

        // t=100
        clock.advance(Duration::seconds(100));
        assert!(!cache.resolve("editor").await.unwrap().grants.allows("news.delete"));

        // t=400
        clock.advance(Duration::seconds(300));
        let resolved = cache.resolve("editor").await.unwrap();
        assert_eq!(resolved.outcome, CacheOutcome::Miss);
        assert!(resolved.grants.allows("news.delete"));
        assert_eq!(store.role_queries(), 2);
    }

    #[tokio::test]
    async fn test_entry_exactly_at_ttl_is_still_fresh() {
        let (cache, store, clock) = setup().await;
        cache.resolve("editor").await.unwrap();
        clock.advance(Duration::seconds(300));
        cache.resolve("editor").await.unwrap();
        assert_eq!(store.role_queries(), 1);

        clock.advance(Duration::seconds(1));
        cache.resolve("editor").await.unwrap();
        assert_eq!(store.role_queries(), 2);
    }

    #[tokio::test]
    async fn test_unknown_role_is_empty_and_cached() {
        let (cache, store, _) = setup().await;
        let grants = cache.resolve("ghost").await.unwrap().grants;
        assert!(!grants.allows("news.read"));

        cache.resolve("ghost").await.unwrap();
        assert_eq!(store.role_queries(), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let (cache, store, _) = setup().await;
        cache.resolve("editor").await.unwrap();

        cache.invalidate("editor");
        cache.resolve("editor").await.unwrap();
        assert_eq!(store.role_queries(), 2);

        cache.invalidate_all();
        assert!(cache.is_empty());
        cache.resolve("editor").await.unwrap();
        assert_eq!(store.role_queries(), 3);
    }

    #[tokio::test]
    async fn test_store_failure_is_not_cached() {
        let (cache, store, _) = setup().await;
        store.fail_role_lookups(true);
        assert!(matches!(
            cache.resolve("editor").await,
            Err(CacheError::Store(_))
        ));
        assert!(cache.is_empty());

        store.fail_role_lookups(false);
        assert!(cache.resolve("editor").await.unwrap().grants.allows("news.update"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_share_one_query() {
        let (cache, store, _) = setup().await;
        store.set_role_delay(std::time::Duration::from_millis(50));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move { cache.resolve("editor").await }));
        }
        for handle in handles {
            let resolved = handle.await.unwrap().unwrap();
            assert!(resolved.grants.allows("news.create"));
        }

        assert_eq!(store.role_queries(), 1);
    }
}

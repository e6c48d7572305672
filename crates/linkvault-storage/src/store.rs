//! Storage collaborator traits consumed by the retention engine.
//!
//! The engine only speaks predicate-based bulk operations, so any document
//! or relational store that can `DELETE ... WHERE` and `COUNT ... WHERE`
//! can back it. `SqliteStore` is the bundled implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use linkvault_core::error::LinkVaultError;
use linkvault_core::types::Plan;

use crate::db::Database;
use crate::filter::LinkFilter;
use crate::repository::{LinkRepository, UserRepository};

/// Bulk operations over short links.
#[async_trait]
pub trait LinkStore: Send + Sync {
    /// Hard-delete matching links; returns how many were removed.
    async fn delete_where(&self, filter: &LinkFilter) -> Result<u64, LinkVaultError>;

    async fn count_where(&self, filter: &LinkFilter) -> Result<u64, LinkVaultError>;

    /// Set `last_accessed_at`; returns false when the id is unknown.
    async fn touch(&self, id: &str, at: DateTime<Utc>) -> Result<bool, LinkVaultError>;

    /// Flag matching active links inactive; returns how many changed.
    async fn deactivate_where(&self, filter: &LinkFilter) -> Result<u64, LinkVaultError>;
}

/// Account operations used by soft cleanup.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn deactivate_users_where(
        &self,
        plan: Plan,
        last_seen_before: DateTime<Utc>,
    ) -> Result<u64, LinkVaultError>;
}

/// SQLite-backed store.
///
/// rusqlite is synchronous, so every call runs on tokio's blocking pool
/// instead of holding the connection mutex on a runtime worker.
pub struct SqliteStore {
    links: Arc<LinkRepository>,
    users: Arc<UserRepository>,
}

impl SqliteStore {
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            links: Arc::new(LinkRepository::new(Arc::clone(&db))),
            users: Arc::new(UserRepository::new(db)),
        }
    }
}

async fn blocking<F, T>(f: F) -> Result<T, LinkVaultError>
where
    F: FnOnce() -> Result<T, LinkVaultError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| LinkVaultError::Storage(format!("Storage task failed: {}", e)))?
}

#[async_trait]
impl LinkStore for SqliteStore {
    async fn delete_where(&self, filter: &LinkFilter) -> Result<u64, LinkVaultError> {
        let links = Arc::clone(&self.links);
        let filter = filter.clone();
        blocking(move || links.delete_where(&filter)).await
    }

    async fn count_where(&self, filter: &LinkFilter) -> Result<u64, LinkVaultError> {
        let links = Arc::clone(&self.links);
        let filter = filter.clone();
        blocking(move || links.count_where(&filter)).await
    }

    async fn touch(&self, id: &str, at: DateTime<Utc>) -> Result<bool, LinkVaultError> {
        let links = Arc::clone(&self.links);
        let id = id.to_string();
        blocking(move || links.touch(&id, at)).await
    }

    async fn deactivate_where(&self, filter: &LinkFilter) -> Result<u64, LinkVaultError> {
        let links = Arc::clone(&self.links);
        let filter = filter.clone();
        blocking(move || links.deactivate_where(&filter)).await
    }
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn deactivate_users_where(
        &self,
        plan: Plan,
        last_seen_before: DateTime<Utc>,
    ) -> Result<u64, LinkVaultError> {
        let users = Arc::clone(&self.users);
        blocking(move || users.deactivate_idle(plan, last_seen_before)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    use linkvault_core::types::{ShortLink, UserType};

    use crate::filter::Condition;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_store_runs_on_blocking_pool() {
        let db = Arc::new(Database::in_memory().unwrap());
        let t0 = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        LinkRepository::new(Arc::clone(&db))
            .insert(&ShortLink::new("a", "https://example.com", UserType::Free, t0))
            .unwrap();
        let store = SqliteStore::new(db);

        assert!(store.touch("a", t0 + Duration::days(1)).await.unwrap());
        assert!(!store.touch("missing", t0).await.unwrap());

        let stale = LinkFilter::all().or(Condition::LastAccessedBefore(t0 + Duration::days(2)));
        assert_eq!(store.count_where(&stale).await.unwrap(), 1);
        assert_eq!(store.delete_where(&stale).await.unwrap(), 1);
        assert_eq!(store.count_where(&stale).await.unwrap(), 0);
    }
}

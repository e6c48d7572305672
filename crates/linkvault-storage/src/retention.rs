//! Tiered retention engine.
//!
//! Sweeps short links past their tier's creation or inactivity horizon, or
//! past an explicit `expires_at`, and reports what is about to go. All
//! cutoffs are derived from one reading of the injected clock per call.
//! Overlapping sweeps are safe: every pass is a predicate delete, and a link
//! that matches a cutoff keeps matching it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use linkvault_core::clock::Clock;
use linkvault_core::error::LinkVaultError;
use linkvault_core::policy::RetentionPolicy;
use linkvault_core::types::{CleanupResult, CleanupStats, Plan, TierCounts, UserType};

use crate::db::Database;
use crate::filter::{Condition, LinkFilter};
use crate::store::{LinkStore, SqliteStore, UserStore};

/// Applies a `RetentionPolicy` to a link store.
pub struct RetentionEngine {
    links: Arc<dyn LinkStore>,
    users: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
    policy: RetentionPolicy,
}

impl RetentionEngine {
    pub fn new(
        links: Arc<dyn LinkStore>,
        users: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            links,
            users,
            clock,
            policy,
        }
    }

    /// Engine over the bundled SQLite store.
    pub fn with_database(db: Arc<Database>, clock: Arc<dyn Clock>, policy: RetentionPolicy) -> Self {
        let store = Arc::new(SqliteStore::new(db));
        Self::new(store.clone(), store, clock, policy)
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Hard-delete every link that has outlived its tier rules or its
    /// explicit expiry.
    ///
    /// Runs one pass per tier, then the tier-independent explicit-expiry
    /// pass. A failing pass aborts the sweep with its error; passes that
    /// already ran stay committed.
    pub async fn cleanup_expired_urls(&self) -> Result<CleanupResult, LinkVaultError> {
        let now = self.clock.now();
        let mut per_tier = TierCounts::default();

        for user_type in UserType::ALL {
            let filter = self.sweep_filter(user_type, now);
            let deleted = self.links.delete_where(&filter).await?;
            debug!(user_type = %user_type, deleted, "Tier pass completed");
            per_tier.set(user_type, deleted);
        }

        let expired = self
            .links
            .delete_where(&LinkFilter::all().or(Condition::ExpiresBefore(now)))
            .await?;
        debug!(deleted = expired, "Explicit expiry pass completed");

        let result = CleanupResult {
            deleted_count: per_tier.total() + expired,
            anonymous_deleted: per_tier.anonymous,
            free_deleted: per_tier.free,
            premium_deleted: per_tier.premium,
        };

        info!(
            deleted_count = result.deleted_count,
            anonymous_deleted = result.anonymous_deleted,
            free_deleted = result.free_deleted,
            premium_deleted = result.premium_deleted,
            "Cleanup sweep completed"
        );

        Ok(result)
    }

    /// Record a successful redirect. Never fails: the redirect it
    /// accompanies must not be held up by bookkeeping.
    pub async fn update_last_accessed(&self, id: &str) {
        let now = self.clock.now();
        match self.links.touch(id, now).await {
            Ok(true) => {}
            Ok(false) => debug!(link_id = %id, "Access recorded for unknown link"),
            Err(e) => warn!(link_id = %id, error = %e, "Failed to record link access"),
        }
    }

    /// Counts of active links, per tier and due within the look-ahead
    /// window. Read-only.
    pub async fn get_cleanup_stats(&self) -> Result<CleanupStats, LinkVaultError> {
        let now = self.clock.now();
        let mut stats = CleanupStats {
            total_urls: self.links.count_where(&LinkFilter::all().active_only()).await?,
            ..CleanupStats::default()
        };

        for user_type in UserType::ALL {
            let active = self
                .links
                .count_where(&LinkFilter::tier(user_type).active_only())
                .await?;
            stats.urls_by_type.set(user_type, active);

            let expiring = self
                .links
                .count_where(&self.expiring_soon_filter(user_type, now))
                .await?;
            stats.expiring_soon.set(user_type, expiring);
        }

        Ok(stats)
    }

    /// Flag free accounts that have not logged in within the configured
    /// window as inactive. Returns how many accounts changed.
    pub async fn cleanup_inactive_users(&self) -> Result<u64, LinkVaultError> {
        let cutoff = self.policy.inactive_user_cutoff(self.clock.now());
        let deactivated = self.users.deactivate_users_where(Plan::Free, cutoff).await?;
        info!(deactivated, cutoff = %cutoff, "Inactive free accounts deactivated");
        Ok(deactivated)
    }

    /// Soft path: flag links past their explicit `expires_at` inactive and
    /// keep them for history. Independent of the hard sweep.
    pub async fn deactivate_expired_urls(&self) -> Result<u64, LinkVaultError> {
        let now = self.clock.now();
        let filter = LinkFilter::all()
            .active_only()
            .or(Condition::ExpiresBefore(now));
        let deactivated = self.links.deactivate_where(&filter).await?;
        info!(deactivated, "Expired links deactivated");
        Ok(deactivated)
    }

    fn sweep_filter(&self, user_type: UserType, now: DateTime<Utc>) -> LinkFilter {
        let ttl = self.policy.ttl(user_type);
        let mut filter = LinkFilter::tier(user_type);
        if ttl.age_limited {
            filter = filter.or(Condition::CreatedBefore(
                self.policy.creation_cutoff(user_type, now),
            ));
        }
        filter.or(Condition::LastAccessedBefore(
            self.policy.inactivity_cutoff(user_type, now),
        ))
    }

    fn expiring_soon_filter(&self, user_type: UserType, now: DateTime<Utc>) -> LinkFilter {
        let policy = &self.policy;
        let mut filter = LinkFilter::tier(user_type)
            .active_only()
            .or(Condition::ExpiresBetween(now, policy.expiring_soon_end(now)));
        if policy.ttl(user_type).age_limited {
            let cutoff = policy.creation_cutoff(user_type, now);
            let end = policy.expiring_soon_end(cutoff);
            filter = filter.or(Condition::CreatedBetween(cutoff, end));
        }
        let cutoff = policy.inactivity_cutoff(user_type, now);
        let end = policy.expiring_soon_end(cutoff);
        filter.or(Condition::LastAccessedBetween(cutoff, end))
    }
}

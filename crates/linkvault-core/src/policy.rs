//! Per-tier retention policy table.
//!
//! A pure mapping from `UserType` to its two time-to-live values. Forward
//! horizons (`now + ttl`) are for display; sweeps use backward cutoffs
//! (`now - ttl`) computed at sweep time, so a policy change applies to
//! existing records on the next sweep.

use chrono::{DateTime, Duration, Utc};

use crate::config::{RetentionConfig, TierRetentionConfig};
use crate::types::UserType;

/// Retention rules for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierTtl {
    pub creation_ttl: Duration,
    pub inactivity_ttl: Duration,
    /// Whether the creation TTL takes part in sweeps. Premium keeps a finite
    /// creation TTL for horizons but is never swept by age.
    pub age_limited: bool,
}

impl TierTtl {
    pub fn days(creation_days: i64, inactivity_days: i64, age_limited: bool) -> Self {
        Self {
            creation_ttl: Duration::days(creation_days),
            inactivity_ttl: Duration::days(inactivity_days),
            age_limited,
        }
    }
}

impl From<&TierRetentionConfig> for TierTtl {
    fn from(config: &TierRetentionConfig) -> Self {
        TierTtl::days(
            i64::from(config.creation_days),
            i64::from(config.inactivity_days),
            config.age_limited,
        )
    }
}

/// Immutable tier table.
///
/// Anonymous and free are separate entries even though they carry the same
/// values by default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionPolicy {
    anonymous: TierTtl,
    free: TierTtl,
    premium: TierTtl,
    expiring_soon_window: Duration,
    inactive_user_ttl: Duration,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_config(&RetentionConfig::default())
    }
}

impl RetentionPolicy {
    pub fn new(anonymous: TierTtl, free: TierTtl, premium: TierTtl) -> Self {
        let defaults = RetentionConfig::default();
        Self {
            anonymous,
            free,
            premium,
            expiring_soon_window: Duration::days(i64::from(defaults.expiring_soon_days)),
            inactive_user_ttl: Duration::days(i64::from(defaults.inactive_user_days)),
        }
    }

    pub fn from_config(config: &RetentionConfig) -> Self {
        Self {
            anonymous: TierTtl::from(&config.anonymous),
            free: TierTtl::from(&config.free),
            premium: TierTtl::from(&config.premium),
            expiring_soon_window: Duration::days(i64::from(config.expiring_soon_days)),
            inactive_user_ttl: Duration::days(i64::from(config.inactive_user_days)),
        }
    }

    pub fn ttl(&self, user_type: UserType) -> &TierTtl {
        match user_type {
            UserType::Anonymous => &self.anonymous,
            UserType::Free => &self.free,
            UserType::Premium => &self.premium,
        }
    }

    pub fn expiring_soon_window(&self) -> Duration {
        self.expiring_soon_window
    }

    pub fn inactive_user_ttl(&self) -> Duration {
        self.inactive_user_ttl
    }

    /// Deadline a link created at `now` would reach by age.
    pub fn creation_horizon(&self, user_type: UserType, now: DateTime<Utc>) -> DateTime<Utc> {
        forward(now, self.ttl(user_type).creation_ttl)
    }

    /// Deadline a link accessed at `now` would reach by inactivity.
    pub fn inactivity_horizon(&self, user_type: UserType, now: DateTime<Utc>) -> DateTime<Utc> {
        forward(now, self.ttl(user_type).inactivity_ttl)
    }

    /// Links created strictly before this instant are too old.
    pub fn creation_cutoff(&self, user_type: UserType, now: DateTime<Utc>) -> DateTime<Utc> {
        back(now, self.ttl(user_type).creation_ttl)
    }

    /// Links last accessed strictly before this instant are abandoned.
    pub fn inactivity_cutoff(&self, user_type: UserType, now: DateTime<Utc>) -> DateTime<Utc> {
        back(now, self.ttl(user_type).inactivity_ttl)
    }

    /// Accounts last seen strictly before this instant are idle.
    pub fn inactive_user_cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        back(now, self.inactive_user_ttl)
    }

    /// End of the look-ahead window starting at `from`.
    pub fn expiring_soon_end(&self, from: DateTime<Utc>) -> DateTime<Utc> {
        forward(from, self.expiring_soon_window)
    }
}

// Saturate at the representable range; a TTL longer than the calendar can
// hold means "never" on that side.
fn forward(t: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    t.checked_add_signed(by).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn back(t: DateTime<Utc>, by: Duration) -> DateTime<Utc> {
    t.checked_sub_signed(by).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_default_table() {
        let policy = RetentionPolicy::default();
        assert_eq!(*policy.ttl(UserType::Anonymous), TierTtl::days(90, 30, true));
        assert_eq!(*policy.ttl(UserType::Free), TierTtl::days(90, 30, true));
        assert_eq!(*policy.ttl(UserType::Premium), TierTtl::days(3650, 365, false));
        assert_eq!(policy.expiring_soon_window(), Duration::days(7));
        assert_eq!(policy.inactive_user_ttl(), Duration::days(365));
    }

    #[test]
    fn test_anonymous_and_free_are_independent_entries() {
        let policy = RetentionPolicy::new(
            TierTtl::days(90, 30, true),
            TierTtl::days(180, 60, true),
            TierTtl::days(3650, 365, false),
        );
        assert_ne!(policy.ttl(UserType::Anonymous), policy.ttl(UserType::Free));
    }

    #[test]
    fn test_forward_horizons() {
        let policy = RetentionPolicy::default();
        assert_eq!(
            policy.creation_horizon(UserType::Anonymous, now()),
            now() + Duration::days(90)
        );
        assert_eq!(
            policy.inactivity_horizon(UserType::Free, now()),
            now() + Duration::days(30)
        );
        assert_eq!(
            policy.creation_horizon(UserType::Premium, now()),
            now() + Duration::days(3650)
        );
        assert_eq!(
            policy.inactivity_horizon(UserType::Premium, now()),
            now() + Duration::days(365)
        );
    }

    #[test]
    fn test_backward_cutoffs() {
        let policy = RetentionPolicy::default();
        assert_eq!(
            policy.creation_cutoff(UserType::Free, now()),
            now() - Duration::days(90)
        );
        assert_eq!(
            policy.inactivity_cutoff(UserType::Anonymous, now()),
            now() - Duration::days(30)
        );
        assert_eq!(
            policy.inactivity_cutoff(UserType::Premium, now()),
            now() - Duration::days(365)
        );
    }

    #[test]
    fn test_from_config() {
        let mut config = RetentionConfig::default();
        config.premium.inactivity_days = 730;
        config.expiring_soon_days = 3;
        let policy = RetentionPolicy::from_config(&config);
        assert_eq!(policy.ttl(UserType::Premium).inactivity_ttl, Duration::days(730));
        assert_eq!(policy.expiring_soon_window(), Duration::days(3));
    }

    #[test]
    fn test_oversized_ttl_saturates_instead_of_overflowing() {
        let policy = RetentionPolicy::new(
            TierTtl::days(90, 30, true),
            TierTtl::days(90, 30, true),
            TierTtl::days(3650, 100_000_000, false),
        );
        assert_eq!(
            policy.inactivity_cutoff(UserType::Premium, now()),
            DateTime::<Utc>::MIN_UTC
        );
        assert_eq!(
            policy.inactivity_horizon(UserType::Premium, now()),
            DateTime::<Utc>::MAX_UTC
        );
    }

    #[test]
    fn test_user_cutoff_and_window_end() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.inactive_user_cutoff(now()), now() - Duration::days(365));
        assert_eq!(policy.expiring_soon_end(now()), now() + Duration::days(7));
    }
}

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LinkVaultError;

// =============================================================================
// Enums
// =============================================================================

/// Owner context of a short link. Selects the retention policy.
///
/// Set once by the link-creation path from the requester's authentication
/// state and never changed afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    /// No account.
    Anonymous,
    /// Registered, free plan.
    Free,
    /// Registered, paid plan.
    Premium,
}

impl UserType {
    /// Every tier, in sweep order.
    pub const ALL: [UserType; 3] = [UserType::Anonymous, UserType::Free, UserType::Premium];

    /// Column value used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Anonymous => "anonymous",
            UserType::Free => "free",
            UserType::Premium => "premium",
        }
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserType {
    type Err = LinkVaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "anonymous" => Ok(UserType::Anonymous),
            "free" => Ok(UserType::Free),
            "premium" => Ok(UserType::Premium),
            other => Err(LinkVaultError::Serialization(format!(
                "unknown user type: {}",
                other
            ))),
        }
    }
}

/// Billing plan of a registered account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    Free,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Premium => "premium",
        }
    }
}

impl FromStr for Plan {
    type Err = LinkVaultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Plan::Free),
            "premium" => Ok(Plan::Premium),
            other => Err(LinkVaultError::Serialization(format!(
                "unknown plan: {}",
                other
            ))),
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A shortened URL record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShortLink {
    /// Opaque slug, assigned at creation.
    pub id: String,
    /// Destination; never interpreted by the retention engine.
    pub original_url: String,
    pub user_type: UserType,
    pub created_at: DateTime<Utc>,
    /// `None` only for rows written before access tracking existed.
    pub last_accessed_at: Option<DateTime<Utc>>,
    /// Absolute deadline that applies regardless of tier rules.
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl ShortLink {
    /// Build a fresh, active link. The inactivity clock starts at creation.
    pub fn new(
        id: impl Into<String>,
        original_url: impl Into<String>,
        user_type: UserType,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            original_url: original_url.into(),
            user_type,
            created_at,
            last_accessed_at: Some(created_at),
            expires_at: None,
            is_active: true,
        }
    }

    pub fn with_expires_at(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_last_accessed_at(mut self, last_accessed_at: DateTime<Utc>) -> Self {
        self.last_accessed_at = Some(last_accessed_at);
        self
    }
}

/// A registered user account, as far as soft cleanup is concerned.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub email: String,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl UserAccount {
    pub fn new(email: impl Into<String>, plan: Plan, created_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            plan,
            created_at,
            last_login_at: None,
            is_active: true,
        }
    }

    pub fn with_last_login_at(mut self, last_login_at: DateTime<Utc>) -> Self {
        self.last_login_at = Some(last_login_at);
        self
    }
}

// =============================================================================
// Engine results
// =============================================================================

/// A count per tier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub anonymous: u64,
    pub free: u64,
    pub premium: u64,
}

impl TierCounts {
    pub fn get(&self, user_type: UserType) -> u64 {
        match user_type {
            UserType::Anonymous => self.anonymous,
            UserType::Free => self.free,
            UserType::Premium => self.premium,
        }
    }

    pub fn set(&mut self, user_type: UserType, count: u64) {
        match user_type {
            UserType::Anonymous => self.anonymous = count,
            UserType::Free => self.free = count,
            UserType::Premium => self.premium = count,
        }
    }

    pub fn total(&self) -> u64 {
        self.anonymous + self.free + self.premium
    }
}

/// Outcome of one sweep.
///
/// `deleted_count` also includes records removed by the explicit-expiration
/// pass, which has no per-tier breakdown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupResult {
    pub deleted_count: u64,
    pub anonymous_deleted: u64,
    pub free_deleted: u64,
    pub premium_deleted: u64,
}

/// Operator-facing snapshot of active links.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupStats {
    pub total_urls: u64,
    pub urls_by_type: TierCounts,
    pub expiring_soon: TierCounts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_user_type_serialization() {
        let json = serde_json::to_string(&UserType::Anonymous).unwrap();
        assert_eq!(json, "\"anonymous\"");
        let back: UserType = serde_json::from_str("\"premium\"").unwrap();
        assert_eq!(back, UserType::Premium);
    }

    #[test]
    fn test_user_type_from_str() {
        for user_type in UserType::ALL {
            assert_eq!(user_type.as_str().parse::<UserType>().unwrap(), user_type);
        }
        assert!("gold".parse::<UserType>().is_err());
    }

    #[test]
    fn test_plan_from_str() {
        assert_eq!("free".parse::<Plan>().unwrap(), Plan::Free);
        assert_eq!("premium".parse::<Plan>().unwrap(), Plan::Premium);
        assert!("anonymous".parse::<Plan>().is_err());
    }

    #[test]
    fn test_new_link_starts_inactivity_clock_at_creation() {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let link = ShortLink::new("abc123", "https://example.com", UserType::Free, created);
        assert_eq!(link.last_accessed_at, Some(created));
        assert!(link.is_active);
        assert!(link.expires_at.is_none());
    }

    #[test]
    fn test_tier_counts_get_set() {
        let mut counts = TierCounts::default();
        counts.set(UserType::Free, 4);
        counts.set(UserType::Premium, 2);
        assert_eq!(counts.get(UserType::Anonymous), 0);
        assert_eq!(counts.get(UserType::Free), 4);
        assert_eq!(counts.total(), 6);
    }

    #[test]
    fn test_cleanup_result_json_keys() {
        let result = CleanupResult {
            deleted_count: 5,
            anonymous_deleted: 1,
            free_deleted: 2,
            premium_deleted: 1,
        };
        let json = serde_json::to_value(result).unwrap();
        assert_eq!(json["deletedCount"], 5);
        assert_eq!(json["anonymousDeleted"], 1);
        assert_eq!(json["freeDeleted"], 2);
        assert_eq!(json["premiumDeleted"], 1);
    }

    #[test]
    fn test_cleanup_stats_json_keys() {
        let stats = CleanupStats {
            total_urls: 3,
            urls_by_type: TierCounts {
                anonymous: 1,
                free: 1,
                premium: 1,
            },
            expiring_soon: TierCounts::default(),
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalUrls"], 3);
        assert_eq!(json["urlsByType"]["premium"], 1);
        assert_eq!(json["expiringSoon"]["anonymous"], 0);
    }
}

//! Repository implementations for SQLite-backed persistence.
//!
//! `LinkRepository` serves the link-creation and redirect collaborators as
//! well as the predicate-based bulk operations behind `LinkStore`.
//! `UserRepository` covers the account fields soft cleanup needs.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use linkvault_core::error::LinkVaultError;
use linkvault_core::types::{Plan, ShortLink, UserAccount};

use crate::db::Database;
use crate::filter::LinkFilter;

/// Repository for short links.
pub struct LinkRepository {
    db: Arc<Database>,
}

impl LinkRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Store a new link.
    ///
    /// A missing `last_accessed_at` is written as `created_at`, so the
    /// inactivity clock of a never-followed link starts at creation.
    pub fn insert(&self, link: &ShortLink) -> Result<(), LinkVaultError> {
        let last_accessed = link.last_accessed_at.unwrap_or(link.created_at);
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO short_links
                    (id, original_url, user_type, created_at, last_accessed_at, expires_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    link.id,
                    link.original_url,
                    link.user_type.as_str(),
                    link.created_at.timestamp_millis(),
                    last_accessed.timestamp_millis(),
                    link.expires_at.map(|t| t.timestamp_millis()),
                    link.is_active as i32,
                ],
            )
            .map_err(|e| LinkVaultError::Storage(format!("Failed to save link: {}", e)))?;
            Ok(())
        })
    }

    /// Find a link by id.
    pub fn find_by_id(&self, id: &str) -> Result<Option<ShortLink>, LinkVaultError> {
        self.db.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT id, original_url, user_type, created_at, last_accessed_at,
                            expires_at, is_active
                     FROM short_links WHERE id = ?1",
                    rusqlite::params![id],
                    |row| Ok(row_to_link(row)),
                )
                .optional()
                .map_err(|e| LinkVaultError::Storage(e.to_string()))?;

            match result {
                Some(link) => Ok(Some(link?)),
                None => Ok(None),
            }
        })
    }

    /// Set `last_accessed_at`. Returns false when the id does not exist.
    pub fn touch(&self, id: &str, at: DateTime<Utc>) -> Result<bool, LinkVaultError> {
        self.db.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE short_links SET last_accessed_at = ?1 WHERE id = ?2",
                    rusqlite::params![at.timestamp_millis(), id],
                )
                .map_err(|e| LinkVaultError::Storage(format!("Failed to touch link: {}", e)))?;
            Ok(updated > 0)
        })
    }

    /// Hard-delete every link matching the filter.
    pub fn delete_where(&self, filter: &LinkFilter) -> Result<u64, LinkVaultError> {
        if filter.is_unconstrained() {
            return Err(LinkVaultError::Storage(
                "Refusing bulk delete without a time condition".to_string(),
            ));
        }
        let (clause, params) = filter.to_sql();
        let sql = format!("DELETE FROM short_links WHERE {}", clause);
        self.db.with_conn(|conn| {
            let deleted = conn
                .execute(&sql, rusqlite::params_from_iter(params.iter()))
                .map_err(|e| LinkVaultError::Storage(format!("Bulk delete failed: {}", e)))?;
            Ok(deleted as u64)
        })
    }

    /// Count links matching the filter.
    pub fn count_where(&self, filter: &LinkFilter) -> Result<u64, LinkVaultError> {
        let (clause, params) = filter.to_sql();
        let sql = format!("SELECT COUNT(*) FROM short_links WHERE {}", clause);
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row(&sql, rusqlite::params_from_iter(params.iter()), |row| {
                    row.get(0)
                })
                .map_err(|e| LinkVaultError::Storage(format!("Count failed: {}", e)))?;
            Ok(count as u64)
        })
    }

    /// Soft-delete: flag matching links inactive without removing them.
    /// Links already inactive are left alone and not counted.
    pub fn deactivate_where(&self, filter: &LinkFilter) -> Result<u64, LinkVaultError> {
        if filter.is_unconstrained() {
            return Err(LinkVaultError::Storage(
                "Refusing bulk deactivation without a time condition".to_string(),
            ));
        }
        let (clause, params) = filter.to_sql();
        let sql = format!(
            "UPDATE short_links SET is_active = 0 WHERE is_active = 1 AND {}",
            clause
        );
        self.db.with_conn(|conn| {
            let updated = conn
                .execute(&sql, rusqlite::params_from_iter(params.iter()))
                .map_err(|e| LinkVaultError::Storage(format!("Bulk deactivate failed: {}", e)))?;
            Ok(updated as u64)
        })
    }

    /// Count all links, active or not.
    pub fn count(&self) -> Result<u64, LinkVaultError> {
        self.db.with_conn(|conn| {
            let count: i64 = conn
                .query_row("SELECT COUNT(*) FROM short_links", [], |row| row.get(0))
                .map_err(|e| LinkVaultError::Storage(e.to_string()))?;
            Ok(count as u64)
        })
    }
}

/// Repository for user accounts.
pub struct UserRepository {
    db: Arc<Database>,
}

impl UserRepository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn insert(&self, user: &UserAccount) -> Result<(), LinkVaultError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (id, email, plan, created_at, last_login_at, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    user.id.to_string(),
                    user.email,
                    user.plan.as_str(),
                    user.created_at.timestamp_millis(),
                    user.last_login_at.map(|t| t.timestamp_millis()),
                    user.is_active as i32,
                ],
            )
            .map_err(|e| LinkVaultError::Storage(format!("Failed to save user: {}", e)))?;
            Ok(())
        })
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<UserAccount>, LinkVaultError> {
        self.db.with_conn(|conn| {
            let result = conn
                .query_row(
                    "SELECT id, email, plan, created_at, last_login_at, is_active
                     FROM users WHERE id = ?1",
                    rusqlite::params![id.to_string()],
                    |row| Ok(row_to_user(row)),
                )
                .optional()
                .map_err(|e| LinkVaultError::Storage(e.to_string()))?;

            match result {
                Some(user) => Ok(Some(user?)),
                None => Ok(None),
            }
        })
    }

    /// Record a successful login. Called by the authentication service, which
    /// owns the login flow; soft cleanup only reads what it writes.
    pub fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, LinkVaultError> {
        self.db.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE users SET last_login_at = ?1, is_active = 1 WHERE id = ?2",
                    rusqlite::params![at.timestamp_millis(), id.to_string()],
                )
                .map_err(|e| LinkVaultError::Storage(format!("Failed to record login: {}", e)))?;
            Ok(updated > 0)
        })
    }

    /// Flag active accounts on `plan` whose last login (or creation, if they
    /// never logged in) is strictly before `before`.
    pub fn deactivate_idle(
        &self,
        plan: Plan,
        before: DateTime<Utc>,
    ) -> Result<u64, LinkVaultError> {
        self.db.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE users SET is_active = 0
                     WHERE is_active = 1 AND plan = ?1
                       AND COALESCE(last_login_at, created_at) < ?2",
                    rusqlite::params![plan.as_str(), before.timestamp_millis()],
                )
                .map_err(|e| {
                    LinkVaultError::Storage(format!("Failed to deactivate users: {}", e))
                })?;
            Ok(updated as u64)
        })
    }
}

// =============================================================================
// Row mapping helpers
// =============================================================================

fn from_millis(millis: i64) -> Result<DateTime<Utc>, LinkVaultError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| LinkVaultError::Storage(format!("Timestamp out of range: {}", millis)))
}

fn row_to_link(row: &rusqlite::Row) -> Result<ShortLink, LinkVaultError> {
    let get_err = |e: rusqlite::Error| LinkVaultError::Storage(e.to_string());

    let user_type: String = row.get(2).map_err(get_err)?;
    let created_at: i64 = row.get(3).map_err(get_err)?;
    let last_accessed_at: Option<i64> = row.get(4).map_err(get_err)?;
    let expires_at: Option<i64> = row.get(5).map_err(get_err)?;
    let is_active: i32 = row.get(6).map_err(get_err)?;

    Ok(ShortLink {
        id: row.get(0).map_err(get_err)?,
        original_url: row.get(1).map_err(get_err)?,
        user_type: user_type.parse()?,
        created_at: from_millis(created_at)?,
        last_accessed_at: last_accessed_at.map(from_millis).transpose()?,
        expires_at: expires_at.map(from_millis).transpose()?,
        is_active: is_active != 0,
    })
}

fn row_to_user(row: &rusqlite::Row) -> Result<UserAccount, LinkVaultError> {
    let get_err = |e: rusqlite::Error| LinkVaultError::Storage(e.to_string());

    let id_str: String = row.get(0).map_err(get_err)?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| LinkVaultError::Storage(format!("Invalid UUID: {}", e)))?;
    let plan: String = row.get(2).map_err(get_err)?;
    let created_at: i64 = row.get(3).map_err(get_err)?;
    let last_login_at: Option<i64> = row.get(4).map_err(get_err)?;
    let is_active: i32 = row.get(5).map_err(get_err)?;

    Ok(UserAccount {
        id,
        email: row.get(1).map_err(get_err)?,
        plan: plan.parse()?,
        created_at: from_millis(created_at)?,
        last_login_at: last_login_at.map(from_millis).transpose()?,
        is_active: is_active != 0,
    })
}

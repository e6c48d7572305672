//! Predicates over short links.
//!
//! A `LinkFilter` is a conjunction of optional tier / active-flag equality
//! checks and a disjunction of time conditions. It renders to a
//! parameterized SQL `WHERE` clause over millisecond timestamps.

use chrono::{DateTime, Utc};
use rusqlite::types::Value;

use linkvault_core::types::UserType;

/// A single time condition. `*Before` bounds are strict, `*Between` bounds
/// are inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    CreatedBefore(DateTime<Utc>),
    /// Measured from `last_accessed_at`, or `created_at` when never accessed.
    LastAccessedBefore(DateTime<Utc>),
    /// Never matches links without an explicit expiry.
    ExpiresBefore(DateTime<Utc>),
    CreatedBetween(DateTime<Utc>, DateTime<Utc>),
    LastAccessedBetween(DateTime<Utc>, DateTime<Utc>),
    ExpiresBetween(DateTime<Utc>, DateTime<Utc>),
}

impl Condition {
    fn sql(&self, params: &mut Vec<Value>) -> &'static str {
        match *self {
            Condition::CreatedBefore(t) => {
                params.push(millis(t));
                "created_at < ?"
            }
            Condition::LastAccessedBefore(t) => {
                params.push(millis(t));
                "COALESCE(last_accessed_at, created_at) < ?"
            }
            Condition::ExpiresBefore(t) => {
                params.push(millis(t));
                "(expires_at IS NOT NULL AND expires_at < ?)"
            }
            Condition::CreatedBetween(from, to) => {
                params.push(millis(from));
                params.push(millis(to));
                "(created_at >= ? AND created_at <= ?)"
            }
            Condition::LastAccessedBetween(from, to) => {
                params.push(millis(from));
                params.push(millis(to));
                "(COALESCE(last_accessed_at, created_at) >= ? \
                  AND COALESCE(last_accessed_at, created_at) <= ?)"
            }
            Condition::ExpiresBetween(from, to) => {
                params.push(millis(from));
                params.push(millis(to));
                "(expires_at IS NOT NULL AND expires_at >= ? AND expires_at <= ?)"
            }
        }
    }
}

fn millis(t: DateTime<Utc>) -> Value {
    Value::Integer(t.timestamp_millis())
}

/// Which links a store operation applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFilter {
    pub user_type: Option<UserType>,
    pub is_active: Option<bool>,
    /// Empty means "no time restriction".
    pub any_of: Vec<Condition>,
}

impl LinkFilter {
    /// Every link.
    pub fn all() -> Self {
        Self::default()
    }

    /// Every link of one tier.
    pub fn tier(user_type: UserType) -> Self {
        Self {
            user_type: Some(user_type),
            ..Self::default()
        }
    }

    pub fn active_only(mut self) -> Self {
        self.is_active = Some(true);
        self
    }

    /// Add a condition to the disjunction.
    pub fn or(mut self, condition: Condition) -> Self {
        self.any_of.push(condition);
        self
    }

    /// True when no time condition restricts the match. Destructive store
    /// calls refuse such filters.
    pub fn is_unconstrained(&self) -> bool {
        self.any_of.is_empty()
    }

    /// Render as a `WHERE` body with positional parameters.
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(user_type) = self.user_type {
            clauses.push("user_type = ?".to_string());
            params.push(Value::Text(user_type.as_str().to_string()));
        }
        if let Some(active) = self.is_active {
            clauses.push("is_active = ?".to_string());
            params.push(Value::Integer(i64::from(active)));
        }
        if !self.any_of.is_empty() {
            let ors: Vec<&str> = self
                .any_of
                .iter()
                .map(|c| c.sql(&mut params))
                .collect();
            clauses.push(format!("({})", ors.join(" OR ")));
        }

        if clauses.is_empty() {
            ("1 = 1".to_string(), params)
        } else {
            (clauses.join(" AND "), params)
        }
    }
}

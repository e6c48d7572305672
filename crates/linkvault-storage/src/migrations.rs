//! Database schema migrations.
//!
//! Applies the initial schema: short_links, users, and the
//! schema_migrations bookkeeping table.

use rusqlite::Connection;
use tracing::info;

use linkvault_core::error::LinkVaultError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), LinkVaultError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| LinkVaultError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| LinkVaultError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
///
/// Timestamps are Unix milliseconds. `last_accessed_at` is nullable for rows
/// imported without access history; readers fall back to `created_at`.
fn apply_v1(conn: &Connection) -> Result<(), LinkVaultError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS short_links (
            id                TEXT PRIMARY KEY NOT NULL,
            original_url      TEXT NOT NULL,
            user_type         TEXT NOT NULL
                              CHECK (user_type IN ('anonymous', 'free', 'premium')),
            created_at        INTEGER NOT NULL,
            last_accessed_at  INTEGER,
            expires_at        INTEGER,
            is_active         INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_short_links_tier_created
            ON short_links (user_type, created_at);

        CREATE INDEX IF NOT EXISTS idx_short_links_tier_accessed
            ON short_links (user_type, last_accessed_at);

        CREATE INDEX IF NOT EXISTS idx_short_links_expires
            ON short_links (expires_at)
            WHERE expires_at IS NOT NULL;

        CREATE TABLE IF NOT EXISTS users (
            id             TEXT PRIMARY KEY NOT NULL,
            email          TEXT NOT NULL UNIQUE,
            plan           TEXT NOT NULL CHECK (plan IN ('free', 'premium')),
            created_at     INTEGER NOT NULL,
            last_login_at  INTEGER,
            is_active      INTEGER NOT NULL DEFAULT 1
        );

        CREATE INDEX IF NOT EXISTS idx_users_plan_login
            ON users (plan, last_login_at);

        INSERT INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| LinkVaultError::Storage(format!("Migration v1 failed: {}", e)))?;

    Ok(())
}

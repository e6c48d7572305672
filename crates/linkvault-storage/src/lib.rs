//! LinkVault storage crate - SQLite persistence and the retention engine.
//!
//! Provides a WAL-mode SQLite database with migrations, repositories for
//! short links and user accounts, the `LinkStore`/`UserStore` collaborator
//! traits, and the tiered `RetentionEngine` that sweeps expired links.

pub mod db;
pub mod filter;
pub mod migrations;
pub mod repository;
pub mod retention;
pub mod store;

pub use db::Database;
pub use filter::{Condition, LinkFilter};
pub use repository::{LinkRepository, UserRepository};
pub use retention::RetentionEngine;
pub use store::{LinkStore, SqliteStore, UserStore};

//! Database layer
//!
//! SQLite through a sqlx pool, schema managed by embedded migrations, and
//! one repository per table.
//!
//! # Usage
//!
//! ```ignore
//! use spendlog::config::DatabaseConfig;
//! use spendlog::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};

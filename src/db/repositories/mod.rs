//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles the queries for one table.

pub mod expense;
pub mod session;
pub mod user;

pub use expense::{ExpenseRepository, SqlxExpenseRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};

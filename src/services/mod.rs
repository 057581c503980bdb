//! Services layer - Business logic
//!
//! Services sit between the HTTP handlers and the repositories. They own
//! validation, the session lifecycle and the statistics derivations.

pub mod expense;
pub mod password;
pub mod statistics;
pub mod user;

pub use expense::{group_by_day, DayGroup, ExpenseItem, ExpenseService, ExpenseServiceError};
pub use password::{hash_password, verify_password};
pub use statistics::{StatisticsReport, StatisticsService, StatisticsServiceError};
pub use user::{LoginInput, UserService, UserServiceError};

//! Data models
//!
//! Database entities, the category catalog and the statistics value types.

mod category;
mod expense;
mod session;
mod stats;
mod user;

pub use category::{CategoryCatalog, CategoryDef, CategoryStyle};
pub use expense::{normalize_date, Expense, ExpensePage, ExpenseUpdate, NewExpense};
pub use session::{Session, SessionInfo};
pub use stats::{month_name, percentage, CategoryTotal, DailyTotal, MonthlyTotal, Period};
pub use user::User;

//! Expense model

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// A recorded expense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: i64,
    pub amount: f64,
    pub description: String,
    /// Free-text category, styled through the category catalog
    pub category: String,
    pub date: DateTime<Utc>,
    /// Creator; `None` for legacy rows or deleted users
    pub user_id: Option<i64>,
}

/// Input for creating an expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: f64,
    pub description: String,
    pub category: String,
    /// Defaults to now when absent
    pub date: Option<DateTime<Utc>>,
    pub user_id: Option<i64>,
}

/// Full replacement of an expense's editable fields
#[derive(Debug, Clone)]
pub struct ExpenseUpdate {
    pub amount: f64,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
}

/// One page of the newest-first expense list
#[derive(Debug, Clone, Default)]
pub struct ExpensePage {
    pub items: Vec<Expense>,
    pub has_more: bool,
    /// Offset of the following page
    pub next_offset: i64,
}

/// Expense dates are stored with whole-second precision.
pub fn normalize_date(date: DateTime<Utc>) -> DateTime<Utc> {
    date.trunc_subsecs(0)
}

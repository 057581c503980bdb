//! Form and query parsing for the HTML handlers
//!
//! Date fields travel as `YYYY-MM-DDTHH:MM:SS` (what a `datetime-local`
//! input with `step="1"` sends); `YYYY-MM-DDTHH:MM` is the one accepted
//! fallback. Both are interpreted as UTC.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Expense;

/// Canonical wire format for expense dates
pub const WIRE_DATETIME: &str = "%Y-%m-%dT%H:%M:%S";
const WIRE_DATETIME_MINUTES: &str = "%Y-%m-%dT%H:%M";

/// Description stored when the field is left blank
pub const DEFAULT_DESCRIPTION: &str = "Expense";
/// Category stored when the field is left blank
pub const DEFAULT_CATEGORY: &str = "other";

/// Parse a wire date; `None` when it matches neither format.
pub fn parse_wire_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, WIRE_DATETIME)
        .or_else(|_| NaiveDateTime::parse_from_str(value, WIRE_DATETIME_MINUTES))
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn format_wire_datetime(date: DateTime<Utc>) -> String {
    date.format(WIRE_DATETIME).to_string()
}

/// Raw expense form, as posted and as re-rendered on error
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExpenseForm {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub date: String,
}

/// Validated expense fields
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseFields {
    pub amount: f64,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
}

impl ExpenseForm {
    /// Empty form with the date preset to `now`
    pub fn blank(now: DateTime<Utc>) -> Self {
        Self {
            date: format_wire_datetime(now),
            ..Self::default()
        }
    }

    /// Form prefilled from a stored expense
    pub fn from_expense(expense: &Expense) -> Self {
        Self {
            amount: format!("{:.2}", expense.amount),
            description: expense.description.clone(),
            category: expense.category.clone(),
            date: format_wire_datetime(expense.date),
        }
    }

    /// Validate the form. The error is a message for the user.
    pub fn parse(&self) -> Result<ExpenseFields, String> {
        let amount = self.amount.trim();
        if amount.is_empty() {
            return Err("Amount is required".to_string());
        }
        let amount = amount
            .parse::<f64>()
            .ok()
            .filter(|a| a.is_finite())
            .ok_or_else(|| format!("Invalid amount: {}", amount))?;

        let date = self.date.trim();
        if date.is_empty() {
            return Err("Date is required".to_string());
        }
        let date = parse_wire_datetime(date).ok_or_else(|| format!("Invalid date: {}", date))?;

        Ok(ExpenseFields {
            amount,
            description: or_default(&self.description, DEFAULT_DESCRIPTION),
            category: or_default(&self.category, DEFAULT_CATEGORY),
            date,
        })
    }
}

fn or_default(value: &str, default: &str) -> String {
    match value.trim() {
        "" => default.to_string(),
        trimmed => trimmed.to_string(),
    }
}

/// Login form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Query of the expense list. Values are parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub offset: Option<String>,
    /// Day of the last row already on screen, `YYYY-MM-DD`
    pub day: Option<String>,
}

impl ListQuery {
    /// Non-negative offset; anything else means 0
    pub fn offset(&self) -> i64 {
        self.offset
            .as_deref()
            .and_then(|o| o.trim().parse::<i64>().ok())
            .filter(|o| *o >= 0)
            .unwrap_or(0)
    }

    pub fn day(&self) -> Option<chrono::NaiveDate> {
        self.day
            .as_deref()
            .and_then(|d| chrono::NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d").ok())
    }
}

/// Query of the statistics page. Values are parsed leniently.
#[derive(Debug, Default, Deserialize)]
pub struct StatisticsQuery {
    pub year: Option<String>,
    pub month: Option<String>,
    /// `year` selects the whole-year view
    pub period: Option<String>,
}

impl StatisticsQuery {
    pub fn year(&self) -> Option<i32> {
        self.year.as_deref().and_then(|y| y.trim().parse().ok())
    }

    /// Month in 1..=12, `None` otherwise
    pub fn month(&self) -> Option<u32> {
        self.month
            .as_deref()
            .and_then(|m| m.trim().parse().ok())
            .filter(|m| (1..=12).contains(m))
    }

    pub fn whole_year(&self) -> bool {
        self.period.as_deref() == Some("year")
    }
}

//! Expense repository
//!
//! CRUD for expenses plus the date-range aggregates behind the statistics
//! page. Every range is half-open, `[start, end)`, and every list is ordered
//! newest first with the id as tie-break so paging is stable.

use crate::models::{
    normalize_date, CategoryTotal, DailyTotal, Expense, ExpenseUpdate, MonthlyTotal, NewExpense,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

/// Expense repository trait
#[async_trait]
pub trait ExpenseRepository: Send + Sync {
    /// Insert an expense. A missing date means now.
    async fn create(&self, input: &NewExpense) -> Result<Expense>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Expense>>;

    /// Up to `limit` expenses, newest first, skipping `offset`
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Expense>>;

    /// All expenses dated within `[start, end)`, newest first
    async fn list_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<Vec<Expense>>;

    /// Replace the editable fields. Returns false if no row matched.
    async fn update(&self, id: i64, update: &ExpenseUpdate) -> Result<bool>;

    /// Hard delete; an unknown id is not an error
    async fn delete(&self, id: i64) -> Result<()>;

    async fn count(&self) -> Result<i64>;

    /// Sum of amounts within `[start, end)`, 0 when empty
    async fn total_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<f64>;

    /// Per-category sum and count, largest total first
    async fn category_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CategoryTotal>>;

    /// Per-month sums for months with activity, ascending
    async fn monthly_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MonthlyTotal>>;

    /// Per-day sums for days with activity, ascending
    async fn daily_totals(&self, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Result<Vec<DailyTotal>>;
}

/// SQLx-based expense repository implementation
pub struct SqlxExpenseRepository {
    pool: SqlitePool,
}

impl SqlxExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ExpenseRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ExpenseRepository for SqlxExpenseRepository {
    async fn create(&self, input: &NewExpense) -> Result<Expense> {
        create_expense(&self.pool, input).await
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Expense>> {
        get_expense_by_id(&self.pool, id).await
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Expense>> {
        list_expenses(&self.pool, limit, offset).await
    }

    async fn list_in_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Expense>> {
        list_expenses_in_range(&self.pool, start, end).await
    }

    async fn update(&self, id: i64, update: &ExpenseUpdate) -> Result<bool> {
        update_expense(&self.pool, id, update).await
    }

    async fn delete(&self, id: i64) -> Result<()> {
        delete_expense(&self.pool, id).await
    }

    async fn count(&self) -> Result<i64> {
        count_expenses(&self.pool).await
    }

    async fn total_in_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<f64> {
        total_in_range(&self.pool, start, end).await
    }

    async fn category_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<CategoryTotal>> {
        category_totals(&self.pool, start, end).await
    }

    async fn monthly_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MonthlyTotal>> {
        monthly_totals(&self.pool, start, end).await
    }

    async fn daily_totals(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DailyTotal>> {
        daily_totals(&self.pool, start, end).await
    }
}

// ============================================================================
// SQLite queries
// ============================================================================

async fn create_expense(pool: &SqlitePool, input: &NewExpense) -> Result<Expense> {
    let date = normalize_date(input.date.unwrap_or_else(Utc::now));

    let result = sqlx::query(
        r#"
        INSERT INTO expenses (amount, description, category, date, user_id, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.amount)
    .bind(&input.description)
    .bind(&input.category)
    .bind(date)
    .bind(input.user_id)
    .bind(normalize_date(Utc::now()))
    .execute(pool)
    .await
    .context("Failed to create expense")?;

    Ok(Expense {
        id: result.last_insert_rowid(),
        amount: input.amount,
        description: input.description.clone(),
        category: input.category.clone(),
        date,
        user_id: input.user_id,
    })
}

async fn get_expense_by_id(pool: &SqlitePool, id: i64) -> Result<Option<Expense>> {
    let row = sqlx::query(
        r#"
        SELECT id, amount, description, category, date, user_id
        FROM expenses
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get expense by ID")?;

    Ok(row.as_ref().map(row_to_expense))
}

async fn list_expenses(pool: &SqlitePool, limit: i64, offset: i64) -> Result<Vec<Expense>> {
    let rows = sqlx::query(
        r#"
        SELECT id, amount, description, category, date, user_id
        FROM expenses
        ORDER BY date DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit.max(0))
    .bind(offset.max(0))
    .fetch_all(pool)
    .await
    .context("Failed to list expenses")?;

    Ok(rows.iter().map(row_to_expense).collect())
}

async fn list_expenses_in_range(
    pool: &SqlitePool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<Expense>> {
    let rows = sqlx::query(
        r#"
        SELECT id, amount, description, category, date, user_id
        FROM expenses
        WHERE date >= ? AND date < ?
        ORDER BY date DESC, id DESC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("Failed to list expenses in range")?;

    Ok(rows.iter().map(row_to_expense).collect())
}

async fn update_expense(pool: &SqlitePool, id: i64, update: &ExpenseUpdate) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE expenses
        SET amount = ?, description = ?, category = ?, date = ?
        WHERE id = ?
        "#,
    )
    .bind(update.amount)
    .bind(&update.description)
    .bind(&update.category)
    .bind(normalize_date(update.date))
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update expense")?;

    Ok(result.rows_affected() > 0)
}

async fn delete_expense(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM expenses WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete expense")?;

    Ok(())
}

async fn count_expenses(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM expenses")
        .fetch_one(pool)
        .await
        .context("Failed to count expenses")?;

    Ok(row.get("count"))
}

async fn total_in_range(pool: &SqlitePool, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<f64> {
    let row = sqlx::query(
        r#"
        SELECT CAST(COALESCE(SUM(amount), 0) AS REAL) AS total
        FROM expenses
        WHERE date >= ? AND date < ?
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(pool)
    .await
    .context("Failed to sum expenses")?;

    Ok(row.get("total"))
}

async fn category_totals(
    pool: &SqlitePool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<CategoryTotal>> {
    let rows = sqlx::query(
        r#"
        SELECT category,
               CAST(SUM(amount) AS REAL) AS total,
               COUNT(*) AS count
        FROM expenses
        WHERE date >= ? AND date < ?
        GROUP BY category
        ORDER BY total DESC, category ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("Failed to get category totals")?;

    Ok(rows
        .iter()
        .map(|row| CategoryTotal {
            category: row.get("category"),
            total: row.get("total"),
            count: row.get("count"),
        })
        .collect())
}

async fn monthly_totals(
    pool: &SqlitePool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<MonthlyTotal>> {
    let rows = sqlx::query(
        r#"
        SELECT CAST(strftime('%m', date) AS INTEGER) AS bucket,
               CAST(SUM(amount) AS REAL) AS total
        FROM expenses
        WHERE date >= ? AND date < ?
        GROUP BY bucket
        ORDER BY bucket ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("Failed to get monthly totals")?;

    Ok(rows
        .iter()
        .map(|row| MonthlyTotal {
            month: bucket(row),
            total: row.get("total"),
        })
        .collect())
}

async fn daily_totals(
    pool: &SqlitePool,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<DailyTotal>> {
    let rows = sqlx::query(
        r#"
        SELECT CAST(strftime('%d', date) AS INTEGER) AS bucket,
               CAST(SUM(amount) AS REAL) AS total
        FROM expenses
        WHERE date >= ? AND date < ?
        GROUP BY bucket
        ORDER BY bucket ASC
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(pool)
    .await
    .context("Failed to get daily totals")?;

    Ok(rows
        .iter()
        .map(|row| DailyTotal {
            day: bucket(row),
            total: row.get("total"),
        })
        .collect())
}

fn bucket(row: &sqlx::sqlite::SqliteRow) -> u32 {
    let value: i64 = row.get("bucket");
    value.clamp(0, 31) as u32
}

fn row_to_expense(row: &sqlx::sqlite::SqliteRow) -> Expense {
    Expense {
        id: row.get("id"),
        amount: row.get("amount"),
        description: row.get("description"),
        category: row.get("category"),
        date: row.get("date"),
        user_id: row.get("user_id"),
    }
}

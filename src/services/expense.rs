//! Expense service
//!
//! Business logic on top of the expense repository: create, edit and delete
//! entries, page through them newest first, and group a page by day for
//! display.

use crate::db::repositories::ExpenseRepository;
use crate::models::{CategoryCatalog, CategoryStyle, Expense, ExpensePage, ExpenseUpdate, NewExpense, Period};
use anyhow::Context;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Default number of rows per page
pub const DEFAULT_PAGE_SIZE: i64 = 20;

/// Upper bound on rows per page
pub const MAX_PAGE_SIZE: i64 = 500;

/// Description marker for money coming in rather than going out
pub const INCOME_MARKER: &str = "[Income]";

/// Error types for expense service operations
#[derive(Debug, thiserror::Error)]
pub enum ExpenseServiceError {
    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Expense not found
    #[error("Expense not found: {0}")]
    NotFound(i64),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Expense service
pub struct ExpenseService {
    repo: Arc<dyn ExpenseRepository>,
    page_size: i64,
}

impl ExpenseService {
    pub fn new(repo: Arc<dyn ExpenseRepository>) -> Self {
        Self::with_page_size(repo, DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(repo: Arc<dyn ExpenseRepository>, page_size: i64) -> Self {
        Self {
            repo,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn page_size(&self) -> i64 {
        self.page_size
    }

    /// Record a new expense. A missing date means now.
    pub async fn create(&self, input: NewExpense) -> Result<Expense, ExpenseServiceError> {
        validate_amount(input.amount)?;

        let expense = self
            .repo
            .create(&input)
            .await
            .context("Failed to create expense")?;

        tracing::debug!("Created expense {} ({:.2} {})", expense.id, expense.amount, expense.category);
        Ok(expense)
    }

    pub async fn get(&self, id: i64) -> Result<Option<Expense>, ExpenseServiceError> {
        let expense = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get expense")?;
        Ok(expense)
    }

    /// Replace an expense's editable fields; the owner is left untouched.
    ///
    /// Concurrent edits are last-write-wins.
    pub async fn update(&self, id: i64, update: ExpenseUpdate) -> Result<(), ExpenseServiceError> {
        validate_amount(update.amount)?;

        let matched = self
            .repo
            .update(id, &update)
            .await
            .context("Failed to update expense")?;

        if !matched {
            return Err(ExpenseServiceError::NotFound(id));
        }
        Ok(())
    }

    /// Delete an expense. Deleting an unknown id succeeds.
    pub async fn delete(&self, id: i64) -> Result<(), ExpenseServiceError> {
        self.repo
            .delete(id)
            .await
            .context("Failed to delete expense")?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64, ExpenseServiceError> {
        Ok(self.repo.count().await.context("Failed to count expenses")?)
    }

    /// Up to `limit` expenses starting at `offset`, newest first
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Expense>, ExpenseServiceError> {
        let items = self
            .repo
            .list(limit, offset)
            .await
            .context("Failed to list expenses")?;
        Ok(items)
    }

    /// One page of the infinite-scroll list.
    ///
    /// Fetches one extra row to learn whether another page follows.
    pub async fn list_page(&self, offset: i64) -> Result<ExpensePage, ExpenseServiceError> {
        let offset = offset.max(0);
        let mut items = self.list(self.page_size.saturating_add(1), offset).await?;

        let has_more = items.len() as i64 > self.page_size;
        items.truncate(self.page_size as usize);
        let next_offset = offset.saturating_add(items.len() as i64);

        Ok(ExpensePage {
            items,
            has_more,
            next_offset,
        })
    }

    /// Sum of the calendar month containing now, independent of paging
    pub async fn current_month_total(&self) -> Result<f64, ExpenseServiceError> {
        let month = Period::month_of(Utc::now());
        let total = self
            .repo
            .total_in_range(month.start(), month.end())
            .await
            .context("Failed to sum current month")?;
        Ok(total)
    }

    /// Replace each group's total with the whole day's sum from the store.
    ///
    /// A page can end in the middle of a day, so summing the rows on screen
    /// under-reports that day.
    pub async fn fill_day_totals(&self, groups: &mut [DayGroup]) -> Result<(), ExpenseServiceError> {
        for group in groups.iter_mut() {
            let Some(start) = group.day.and_hms_opt(0, 0, 0).map(|t| t.and_utc()) else {
                continue;
            };
            let Some(end) = start.checked_add_signed(Duration::days(1)) else {
                continue;
            };
            group.total = self
                .repo
                .total_in_range(start, end)
                .await
                .with_context(|| format!("Failed to sum expenses of {}", group.date))?;
        }
        Ok(())
    }
}

fn validate_amount(amount: f64) -> Result<(), ExpenseServiceError> {
    if !amount.is_finite() {
        return Err(ExpenseServiceError::ValidationError(
            "Amount must be a finite number".to_string(),
        ));
    }
    Ok(())
}

/// One expense as shown in the list
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseItem {
    pub id: i64,
    pub amount: f64,
    pub description: String,
    pub category: String,
    /// `HH:MM`
    pub time: String,
    pub style: CategoryStyle,
    /// Description carries the income marker
    pub is_income: bool,
}

/// Expenses of one calendar day
#[derive(Debug, Clone, Serialize)]
pub struct DayGroup {
    #[serde(skip)]
    pub day: NaiveDate,
    /// `YYYY-MM-DD`
    pub date: String,
    /// TODAY, YESTERDAY or e.g. `MON, 03 NOV '25`
    pub title: String,
    /// Sum of the day; `fill_day_totals` widens it beyond the current page
    pub total: f64,
    /// False when the group continues the previous page's last day
    pub show_header: bool,
    pub items: Vec<ExpenseItem>,
}

/// Group newest-first expenses into day groups.
///
/// `continues_from` is the day of the last row on the previous page; a group
/// for that same day gets no header since one is already on screen.
pub fn group_by_day(
    expenses: &[Expense],
    catalog: &CategoryCatalog,
    now: DateTime<Utc>,
    continues_from: Option<NaiveDate>,
) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();

    for expense in expenses {
        let day = expense.date.date_naive();
        let date = day.format("%Y-%m-%d").to_string();

        let item = ExpenseItem {
            id: expense.id,
            amount: expense.amount,
            description: expense.description.clone(),
            category: expense.category.clone(),
            time: expense.date.format("%H:%M").to_string(),
            style: catalog.style_for(&expense.category),
            is_income: expense.description.contains(INCOME_MARKER),
        };

        match groups.last_mut() {
            Some(group) if group.date == date => {
                group.total += expense.amount;
                group.items.push(item);
            }
            _ => groups.push(DayGroup {
                day,
                title: group_title(day, now),
                show_header: continues_from != Some(day),
                total: expense.amount,
                items: vec![item],
                date,
            }),
        }
    }

    groups
}

/// Heading of a day group relative to `now`
pub fn group_title(day: NaiveDate, now: DateTime<Utc>) -> String {
    let today = now.date_naive();
    if day == today {
        "TODAY".to_string()
    } else if Some(day) == today.checked_sub_signed(Duration::days(1)) {
        "YESTERDAY".to_string()
    } else {
        day.format("%a, %d %b '%y").to_string().to_uppercase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxExpenseRepository;
    use crate::db::{create_test_pool, migrations};
    use crate::models::CategoryDef;
    use chrono::TimeZone;

    async fn setup_service(page_size: i64) -> ExpenseService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        ExpenseService::with_page_size(SqlxExpenseRepository::boxed(pool), page_size)
    }

    fn input(amount: f64, date: DateTime<Utc>) -> NewExpense {
        NewExpense {
            amount,
            description: "Lunch".to_string(),
            category: "food".to_string(),
            date: Some(date),
            user_id: None,
        }
    }

    fn expense(id: i64, amount: f64, date: DateTime<Utc>) -> Expense {
        Expense {
            id,
            amount,
            description: format!("item {}", id),
            category: "food".to_string(),
            date,
            user_id: None,
        }
    }

    fn catalog() -> CategoryCatalog {
        CategoryCatalog::new(vec![
            CategoryDef::new("food", "Food", "🍽️", "#60a5fa"),
            CategoryDef::new("other", "Other", "📦", "#94a3b8"),
        ])
    }

    #[tokio::test]
    async fn test_create_rejects_non_finite_amount() {
        let service = setup_service(20).await;

        let result = service.create(input(f64::NAN, Utc::now())).await;
        assert!(matches!(result, Err(ExpenseServiceError::ValidationError(_))));

        let result = service.create(input(f64::INFINITY, Utc::now())).await;
        assert!(matches!(result, Err(ExpenseServiceError::ValidationError(_))));

        assert_eq!(service.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let service = setup_service(20).await;
        let result = service
            .update(
                99,
                ExpenseUpdate {
                    amount: 1.0,
                    description: "x".to_string(),
                    category: "food".to_string(),
                    date: Utc::now(),
                },
            )
            .await;
        assert!(matches!(result, Err(ExpenseServiceError::NotFound(99))));
    }

    #[tokio::test]
    async fn test_update_keeps_owner() {
        let service = setup_service(20).await;
        let created = service.create(input(5.0, Utc::now())).await.unwrap();

        service
            .update(
                created.id,
                ExpenseUpdate {
                    amount: 8.0,
                    description: "Dinner".to_string(),
                    category: "food".to_string(),
                    date: created.date,
                },
            )
            .await
            .unwrap();

        let found = service.get(created.id).await.unwrap().unwrap();
        assert_eq!(found.amount, 8.0);
        assert_eq!(found.user_id, created.user_id);
    }

    #[tokio::test]
    async fn test_list_page_detects_more() {
        let service = setup_service(2).await;
        let base = Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap();
        for i in 0..5 {
            service.create(input(i as f64, base + Duration::hours(i))).await.unwrap();
        }

        let first = service.list_page(0).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(first.has_more);
        assert_eq!(first.next_offset, 2);
        assert_eq!(first.items[0].amount, 4.0);

        let last = service.list_page(4).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);
        assert_eq!(last.next_offset, 5);
    }

    #[tokio::test]
    async fn test_list_page_exact_fit_has_no_more() {
        let service = setup_service(2).await;
        service.create(input(1.0, Utc::now())).await.unwrap();
        service.create(input(2.0, Utc::now())).await.unwrap();

        let page = service.list_page(0).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_huge_page_size_is_capped() {
        let service = setup_service(i64::MAX).await;
        assert_eq!(service.page_size(), MAX_PAGE_SIZE);

        service.create(input(1.0, Utc::now())).await.unwrap();
        let page = service.list_page(0).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_more);
    }

    #[tokio::test]
    async fn test_day_total_spans_page_boundary() {
        let service = setup_service(2).await;
        let now = Utc.with_ymd_and_hms(2025, 11, 10, 18, 0, 0).unwrap();
        let day = Utc.with_ymd_and_hms(2025, 11, 3, 9, 0, 0).unwrap();
        for i in 0..3 {
            service.create(input(10.0, day + Duration::hours(i))).await.unwrap();
        }
        service
            .create(input(99.0, day - Duration::hours(10)))
            .await
            .unwrap();

        let page = service.list_page(0).await.unwrap();
        let mut groups = group_by_day(&page.items, &catalog(), now, None);
        assert_eq!(groups[0].total, 20.0);

        service.fill_day_totals(&mut groups).await.unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].show_header);
        assert_eq!(groups[0].total, 30.0);
    }

    #[tokio::test]
    async fn test_current_month_total_ignores_other_months() {
        let service = setup_service(1).await;
        let now = Utc::now();
        let this_month = Period::month_of(now);

        service.create(input(10.0, this_month.start())).await.unwrap();
        service.create(input(15.0, this_month.start() + Duration::hours(1))).await.unwrap();
        service
            .create(input(100.0, this_month.start() - Duration::seconds(1)))
            .await
            .unwrap();

        assert_eq!(service.current_month_total().await.unwrap(), 25.0);
    }

    #[test]
    fn test_group_by_day() {
        let now = Utc.with_ymd_and_hms(2025, 11, 10, 18, 0, 0).unwrap();
        let expenses = vec![
            expense(4, 3.0, Utc.with_ymd_and_hms(2025, 11, 10, 9, 5, 0).unwrap()),
            expense(3, 2.0, Utc.with_ymd_and_hms(2025, 11, 10, 8, 0, 0).unwrap()),
            expense(2, 5.0, Utc.with_ymd_and_hms(2025, 11, 9, 20, 0, 0).unwrap()),
            expense(1, 7.5, Utc.with_ymd_and_hms(2025, 11, 3, 7, 30, 0).unwrap()),
        ];

        let groups = group_by_day(&expenses, &catalog(), now, None);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].title, "TODAY");
        assert_eq!(groups[0].total, 5.0);
        assert_eq!(groups[0].items[0].time, "09:05");
        assert_eq!(groups[1].title, "YESTERDAY");
        assert_eq!(groups[2].title, "MON, 03 NOV '25");
        assert_eq!(groups[2].date, "2025-11-03");
        assert!(groups.iter().all(|g| g.show_header));
        assert_eq!(groups[0].items[0].style.color, "#60a5fa");
    }

    #[test]
    fn test_income_marker() {
        let now = Utc.with_ymd_and_hms(2025, 11, 10, 18, 0, 0).unwrap();
        let mut salary = expense(2, 1500.0, now);
        salary.description = "Salary [Income]".to_string();
        let expenses = vec![salary, expense(1, 4.0, now)];

        let groups = group_by_day(&expenses, &catalog(), now, None);

        assert!(groups[0].items[0].is_income);
        assert!(!groups[0].items[1].is_income);
    }

    #[test]
    fn test_group_continuing_previous_page_has_no_header() {
        let now = Utc.with_ymd_and_hms(2025, 11, 10, 18, 0, 0).unwrap();
        let day = Utc.with_ymd_and_hms(2025, 11, 5, 9, 0, 0).unwrap();
        let expenses = vec![
            expense(2, 1.0, day),
            expense(1, 1.0, day - Duration::days(1)),
        ];

        let groups = group_by_day(&expenses, &catalog(), now, Some(day.date_naive()));

        assert!(!groups[0].show_header);
        assert!(groups[1].show_header);
    }

    #[test]
    fn test_group_title_crosses_year() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 30, 0).unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(group_title(day, now), "YESTERDAY");

        let older = NaiveDate::from_ymd_opt(2025, 12, 24).unwrap();
        assert_eq!(group_title(older, now), "WED, 24 DEC '25");
    }
}

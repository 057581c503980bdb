//! Statistics service
//!
//! Aggregates spending over a [`Period`]: totals per category, per month of a
//! year or per day of a month, plus the report that feeds the statistics
//! page.

use crate::db::repositories::ExpenseRepository;
use crate::models::{
    month_name, percentage, CategoryCatalog, CategoryStyle, CategoryTotal, DailyTotal, Expense,
    MonthlyTotal, Period,
};
use crate::services::expense::{group_by_day, DayGroup};
use anyhow::Context;
use chrono::{DateTime, Datelike, Utc};
use serde::Serialize;
use std::sync::Arc;

/// Error types for statistics operations
#[derive(Debug, thiserror::Error)]
pub enum StatisticsServiceError {
    #[error("Invalid period: year {year}, month {month}")]
    InvalidPeriod { year: i32, month: u32 },

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A category's slice of the period total
#[derive(Debug, Clone, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub total: f64,
    pub count: i64,
    pub percentage: f64,
    pub style: CategoryStyle,
}

/// One bar of the spending chart
#[derive(Debug, Clone, Serialize)]
pub struct Bucket {
    /// Day of month or abbreviated month name
    pub label: String,
    pub total: f64,
    /// Bar height relative to the largest bucket, 0..=100
    pub height: f64,
}

/// Navigation target for the previous/next period
#[derive(Debug, Clone, Serialize)]
pub struct PeriodLink {
    /// Query string for `/statistics`
    pub query: String,
    pub label: String,
}

impl PeriodLink {
    fn for_period(period: &Period) -> Self {
        let query = if period.is_whole_year() {
            format!("year={}&period=year", period.year_number())
        } else {
            format!("year={}&month={}", period.year_number(), period.month_number())
        };
        Self {
            query,
            label: period.label(),
        }
    }
}

/// Everything the statistics page shows
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsReport {
    pub year: i32,
    /// 0 for a whole-year report
    pub month: u32,
    pub is_year: bool,
    pub label: String,
    pub total: f64,
    pub transaction_count: i64,
    pub categories: Vec<CategoryShare>,
    pub buckets: Vec<Bucket>,
    pub groups: Vec<DayGroup>,
    pub previous: Option<PeriodLink>,
    pub next: Option<PeriodLink>,
    /// Same year, toggling between month and year view
    pub toggle: PeriodLink,
}

/// Statistics service
pub struct StatisticsService {
    repo: Arc<dyn ExpenseRepository>,
    catalog: Arc<CategoryCatalog>,
}

impl StatisticsService {
    pub fn new(repo: Arc<dyn ExpenseRepository>, catalog: Arc<CategoryCatalog>) -> Self {
        Self { repo, catalog }
    }

    /// Validate a (year, month) pair; month 0 selects the whole year
    pub fn period(year: i32, month: u32) -> Result<Period, StatisticsServiceError> {
        Period::new(year, month).ok_or(StatisticsServiceError::InvalidPeriod { year, month })
    }

    /// Expenses in the period, newest first
    pub async fn expenses(&self, period: &Period) -> Result<Vec<Expense>, StatisticsServiceError> {
        let expenses = self
            .repo
            .list_in_range(period.start(), period.end())
            .await
            .context("Failed to list expenses for period")?;
        Ok(expenses)
    }

    /// Per-category totals, largest first, ties by name
    pub async fn category_totals(
        &self,
        period: &Period,
    ) -> Result<Vec<CategoryTotal>, StatisticsServiceError> {
        let totals = self
            .repo
            .category_totals(period.start(), period.end())
            .await
            .context("Failed to get category totals")?;
        Ok(totals)
    }

    /// Months of `year` that have expenses, ascending
    pub async fn monthly_totals(&self, year: i32) -> Result<Vec<MonthlyTotal>, StatisticsServiceError> {
        let period = Self::period(year, 0)?;
        let totals = self
            .repo
            .monthly_totals(period.start(), period.end())
            .await
            .context("Failed to get monthly totals")?;
        Ok(totals)
    }

    /// Days of the month that have expenses, ascending
    pub async fn daily_totals(
        &self,
        year: i32,
        month: u32,
    ) -> Result<Vec<DailyTotal>, StatisticsServiceError> {
        let period = Period::month(year, month)
            .ok_or(StatisticsServiceError::InvalidPeriod { year, month })?;
        let totals = self
            .repo
            .daily_totals(period.start(), period.end())
            .await
            .context("Failed to get daily totals")?;
        Ok(totals)
    }

    /// Total spent in the period, 0 when nothing was recorded
    pub async fn total(&self, period: &Period) -> Result<f64, StatisticsServiceError> {
        let total = self
            .repo
            .total_in_range(period.start(), period.end())
            .await
            .context("Failed to get period total")?;
        Ok(total)
    }

    /// Build the full report for one period
    pub async fn report(
        &self,
        period: Period,
        now: DateTime<Utc>,
    ) -> Result<StatisticsReport, StatisticsServiceError> {
        let total = self.total(&period).await?;
        let category_totals = self.category_totals(&period).await?;
        let expenses = self.expenses(&period).await?;

        let buckets = if period.is_whole_year() {
            let monthly = self.monthly_totals(period.year_number()).await?;
            fill_months(&monthly)
        } else {
            let daily = self
                .daily_totals(period.year_number(), period.month_number())
                .await?;
            fill_days(&daily, period.days_in_month())
        };

        let transaction_count = category_totals.iter().map(|c| c.count).sum();
        let categories = category_totals
            .into_iter()
            .map(|c| CategoryShare {
                percentage: percentage(c.total, total),
                style: self.catalog.style_for(&c.category),
                category: c.category,
                total: c.total,
                count: c.count,
            })
            .collect();

        let toggle = if period.is_whole_year() {
            let month = if now.year() == period.year_number() {
                Period::month_of(now)
            } else {
                Period::month(period.year_number(), 1).unwrap_or(period)
            };
            PeriodLink::for_period(&month)
        } else {
            PeriodLink::for_period(&Period::year(period.year_number()).unwrap_or(period))
        };

        Ok(StatisticsReport {
            year: period.year_number(),
            month: period.month_number(),
            is_year: period.is_whole_year(),
            label: period.label(),
            total,
            transaction_count,
            categories,
            buckets: scale(buckets),
            groups: group_by_day(&expenses, &self.catalog, now, None),
            previous: period.previous().as_ref().map(PeriodLink::for_period),
            next: period.next().as_ref().map(PeriodLink::for_period),
            toggle,
        })
    }
}

/// One bucket per month, zero where absent
fn fill_months(totals: &[MonthlyTotal]) -> Vec<(String, f64)> {
    (1..=12)
        .map(|m| {
            let total = totals
                .iter()
                .find(|t| t.month == m)
                .map_or(0.0, |t| t.total);
            let label = month_name(m).map_or_else(|| m.to_string(), |n| n[..3].to_string());
            (label, total)
        })
        .collect()
}

/// One bucket per day of the month, zero where absent
fn fill_days(totals: &[DailyTotal], days_in_month: u32) -> Vec<(String, f64)> {
    (1..=days_in_month)
        .map(|d| {
            let total = totals.iter().find(|t| t.day == d).map_or(0.0, |t| t.total);
            (d.to_string(), total)
        })
        .collect()
}

fn scale(raw: Vec<(String, f64)>) -> Vec<Bucket> {
    let max = raw.iter().map(|(_, t)| *t).fold(0.0_f64, f64::max);
    raw.into_iter()
        .map(|(label, total)| Bucket {
            height: if max > 0.0 { percentage(total, max) } else { 0.0 },
            label,
            total,
        })
        .collect()
}

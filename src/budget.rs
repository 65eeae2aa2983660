//! Spend aggregation and budget warning levels.

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{DANGER_THRESHOLD_PERCENT, WARNING_THRESHOLD_PERCENT};
use crate::models::{BudgetLimit, BudgetPeriod, Category, Expense};

/// Qualitative spend-vs-limit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    None,
    Warning,
    Danger,
}

impl WarningLevel {
    /// Status text shown next to a budget's progress bar
    pub fn label(&self) -> &'static str {
        match self {
            WarningLevel::None => "Within Budget",
            WarningLevel::Warning => "Near Limit",
            WarningLevel::Danger => "Over Budget!",
        }
    }
}

/// Whether `date` falls in the same window as `now`, judged in `now`'s timezone
fn in_period<Tz: TimeZone>(date: &DateTime<Utc>, period: BudgetPeriod, now: &DateTime<Tz>) -> bool {
    let local = date.with_timezone(&now.timezone());
    match period {
        BudgetPeriod::Monthly => local.month() == now.month() && local.year() == now.year(),
        BudgetPeriod::Yearly => local.year() == now.year(),
    }
}

/// Sum of expenses in `category` during the current month or year (local clock)
pub fn calculate_spent_amount(
    expenses: &[Expense],
    category: Category,
    period: BudgetPeriod,
) -> Decimal {
    calculate_spent_amount_at(expenses, category, period, &Local::now())
}

/// Same as [`calculate_spent_amount`] with an explicit "now"
pub fn calculate_spent_amount_at<Tz: TimeZone>(
    expenses: &[Expense],
    category: Category,
    period: BudgetPeriod,
    now: &DateTime<Tz>,
) -> Decimal {
    saturating_sum(
        expenses
            .iter()
            .filter(|e| e.category == category && in_period(&e.date, period, now))
            .map(|e| e.amount),
    )
}

/// Sum that clamps at the `Decimal` range instead of panicking
fn saturating_sum(amounts: impl Iterator<Item = Decimal>) -> Decimal {
    amounts.fold(Decimal::ZERO, |total, amount| {
        total.checked_add(amount).unwrap_or_else(|| {
            tracing::warn!("Expense total out of range, clamping");
            if amount.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            }
        })
    })
}

/// Spent as a percentage of the limit
///
/// `None` when the limit is zero or the result is out of range.
pub fn spent_percentage(spent: Decimal, limit: Decimal) -> Option<Decimal> {
    spent
        .checked_div(limit)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Whether `spent` is at least `percent`% of a nonzero `limit`
fn reaches(spent: Decimal, limit: Decimal, percent: u32) -> bool {
    let percent = Decimal::from(percent);
    match (
        spent.checked_mul(Decimal::ONE_HUNDRED),
        limit.checked_mul(percent),
    ) {
        (Some(lhs), Some(rhs)) => lhs >= rhs,
        // Too large to scale; compare the ratio instead
        _ => match spent.checked_div(limit) {
            Some(ratio) => ratio
                .checked_mul(Decimal::ONE_HUNDRED)
                .map_or(ratio > Decimal::ZERO, |scaled| scaled >= percent),
            None => spent > Decimal::ZERO,
        },
    }
}

/// Classify spending against a limit: danger at 100%, warning at 80%
///
/// A zero limit counts any positive spend as over budget.
pub fn get_budget_warning_level(spent: Decimal, limit: Decimal) -> WarningLevel {
    if limit.is_zero() {
        return if spent > Decimal::ZERO {
            WarningLevel::Danger
        } else {
            WarningLevel::None
        };
    }

    if reaches(spent, limit, DANGER_THRESHOLD_PERCENT) {
        WarningLevel::Danger
    } else if reaches(spent, limit, WARNING_THRESHOLD_PERCENT) {
        WarningLevel::Warning
    } else {
        WarningLevel::None
    }
}

/// Aggregate figures over a full expense list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSummary {
    pub total: Decimal,
    pub this_month: Decimal,
    pub average: Decimal,
    pub count: usize,
}

impl ExpenseSummary {
    pub fn from_expenses(expenses: &[Expense]) -> Self {
        Self::from_expenses_at(expenses, &Local::now())
    }

    pub fn from_expenses_at<Tz: TimeZone>(expenses: &[Expense], now: &DateTime<Tz>) -> Self {
        let total = saturating_sum(expenses.iter().map(|e| e.amount));
        let this_month = saturating_sum(
            expenses
                .iter()
                .filter(|e| in_period(&e.date, BudgetPeriod::Monthly, now))
                .map(|e| e.amount),
        );
        let count = expenses.len();
        let average = if count > 0 {
            total / Decimal::from(count)
        } else {
            Decimal::ZERO
        };

        Self {
            total,
            this_month,
            average,
            count,
        }
    }
}

/// Progress of one budget limit in its current window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub limit: BudgetLimit,
    pub spent: Decimal,
    /// Percentage of the limit used, capped at 100 for display
    pub percentage: Decimal,
    pub warning_level: WarningLevel,
    pub label: String,
}

impl BudgetStatus {
    pub fn compute<Tz: TimeZone>(
        limit: &BudgetLimit,
        expenses: &[Expense],
        now: &DateTime<Tz>,
    ) -> Self {
        let spent = calculate_spent_amount_at(expenses, limit.category, limit.period, now);
        let warning_level = get_budget_warning_level(spent, limit.amount);
        let percentage = match spent_percentage(spent, limit.amount) {
            Some(p) => p.min(Decimal::ONE_HUNDRED).max(Decimal::ZERO).round_dp(2),
            None if warning_level == WarningLevel::Danger => Decimal::ONE_HUNDRED,
            None => Decimal::ZERO,
        };

        Self {
            limit: limit.clone(),
            spent,
            percentage,
            warning_level,
            label: warning_level.label().to_string(),
        }
    }
}

/// Status of every limit against the local clock
pub fn budget_statuses(limits: &[BudgetLimit], expenses: &[Expense]) -> Vec<BudgetStatus> {
    budget_statuses_at(limits, expenses, &Local::now())
}

pub fn budget_statuses_at<Tz: TimeZone>(
    limits: &[BudgetLimit],
    expenses: &[Expense],
    now: &DateTime<Tz>,
) -> Vec<BudgetStatus> {
    limits
        .iter()
        .map(|limit| BudgetStatus::compute(limit, expenses, now))
        .collect()
}

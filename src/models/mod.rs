pub mod budget_limit;
pub mod category;
pub mod expense;
pub mod user;

pub use budget_limit::{BudgetLimit, BudgetLimitRecord, BudgetLimitUpdate, NewBudgetLimit};
pub use category::{BudgetPeriod, Category};
pub use expense::{is_valid_amount, within_max_amount, Expense, ExpenseRecord, NewExpense};
pub use user::{Profile, ProfileRecord, SessionRecord, User, UserRecord};

use chrono::{DateTime, Utc};

/// Convert stored Unix milliseconds back to a UTC timestamp, defaulting to now if invalid
pub fn from_millis(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{ERR_AMOUNT_TOO_LARGE, ERR_INVALID_LIMIT_AMOUNT};
use crate::models::{from_millis, is_valid_amount, within_max_amount, BudgetPeriod, Category};

/// Budget limit record stored in redb
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetLimitRecord {
    pub user_id: String,
    pub category: Category,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub period: BudgetPeriod,
    pub created_at: i64,
}

impl BudgetLimitRecord {
    pub fn into_budget_limit(self, id: String) -> BudgetLimit {
        BudgetLimit {
            id,
            user_id: self.user_id,
            category: self.category,
            amount: self.amount,
            period: self.period,
            created_at: Some(from_millis(self.created_at)),
        }
    }

    /// Whether this record occupies the (owner, category, period) slot
    pub fn occupies(&self, user_id: &str, category: Category, period: BudgetPeriod) -> bool {
        self.user_id == user_id && self.category == category && self.period == period
    }
}

/// Spending ceiling for one category over a period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLimit {
    pub id: String,
    pub user_id: String,
    pub category: Category,
    pub amount: Decimal,
    pub period: BudgetPeriod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A budget limit being created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBudgetLimit {
    pub amount: Decimal,
    pub category: Category,
    pub period: BudgetPeriod,
}

impl NewBudgetLimit {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_limit_amount(self.amount)
    }
}

/// Fields of a budget limit that may change after creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLimitUpdate {
    pub amount: Decimal,
    pub period: BudgetPeriod,
}

impl BudgetLimitUpdate {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_limit_amount(self.amount)
    }
}

fn validate_limit_amount(amount: Decimal) -> Result<(), &'static str> {
    if amount <= Decimal::ZERO || !is_valid_amount(amount) {
        return Err(ERR_INVALID_LIMIT_AMOUNT);
    }
    if !within_max_amount(amount) {
        return Err(ERR_AMOUNT_TOO_LARGE);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_amount_must_be_positive() {
        let mut limit = NewBudgetLimit {
            amount: Decimal::new(50000, 2),
            category: Category::Food,
            period: BudgetPeriod::Monthly,
        };
        assert!(limit.validate().is_ok());

        limit.amount = Decimal::ZERO;
        assert_eq!(limit.validate(), Err(ERR_INVALID_LIMIT_AMOUNT));

        limit.amount = Decimal::new(-100, 0);
        assert_eq!(limit.validate(), Err(ERR_INVALID_LIMIT_AMOUNT));

        limit.amount = Decimal::new(1_000_000_001, 0);
        assert_eq!(limit.validate(), Err(ERR_AMOUNT_TOO_LARGE));

        let update = BudgetLimitUpdate {
            amount: Decimal::new(1_000_000_001, 0),
            period: BudgetPeriod::Yearly,
        };
        assert_eq!(update.validate(), Err(ERR_AMOUNT_TOO_LARGE));
    }

    #[test]
    fn test_occupies_matches_owner_category_and_period() {
        let record = BudgetLimitRecord {
            user_id: "owner".to_string(),
            category: Category::Health,
            amount: Decimal::new(100, 0),
            period: BudgetPeriod::Yearly,
            created_at: 0,
        };
        assert!(record.occupies("owner", Category::Health, BudgetPeriod::Yearly));
        assert!(!record.occupies("owner", Category::Health, BudgetPeriod::Monthly));
        assert!(!record.occupies("owner", Category::Food, BudgetPeriod::Yearly));
        assert!(!record.occupies("someone-else", Category::Health, BudgetPeriod::Yearly));
    }
}

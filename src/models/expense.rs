use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ERR_AMOUNT_TOO_LARGE, ERR_DESCRIPTION_TOO_LONG, ERR_INVALID_AMOUNT, MAX_AMOUNT,
    MAX_DESCRIPTION_LEN,
};
use crate::models::{from_millis, Category};

/// Expense record stored in redb
/// The amount is kept as its decimal string; `created_at` is Unix milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub category: Category,
    pub description: String,
    pub date: DateTime<Utc>,
    pub created_at: i64,
}

impl ExpenseRecord {
    pub fn into_expense(self, id: String) -> Expense {
        Expense {
            id,
            user_id: Some(self.user_id),
            amount: self.amount,
            category: self.category,
            description: self.description,
            date: self.date,
            created_at: Some(from_millis(self.created_at)),
        }
    }
}

/// A complete expense as exchanged with clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    /// Absent for expenses kept only in local storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub amount: Decimal,
    pub category: Category,
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Expense {
    /// Build an expense that only lives on the client (anonymous mode)
    pub fn local(id: String, new_expense: NewExpense) -> Self {
        Self {
            id,
            user_id: None,
            amount: new_expense.amount,
            category: new_expense.category,
            description: new_expense.description,
            date: new_expense.date,
            created_at: None,
        }
    }

    /// The editable fields of this expense
    pub fn fields(&self) -> NewExpense {
        NewExpense {
            amount: self.amount,
            category: self.category,
            description: self.description.clone(),
            date: self.date,
        }
    }
}

/// An expense being created, without system-generated fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewExpense {
    pub amount: Decimal,
    pub category: Category,
    #[serde(default)]
    pub description: String,
    pub date: DateTime<Utc>,
}

impl NewExpense {
    pub fn validate(&self) -> Result<(), &'static str> {
        if !is_valid_amount(self.amount) || self.amount.is_sign_negative() {
            return Err(ERR_INVALID_AMOUNT);
        }
        if !within_max_amount(self.amount) {
            return Err(ERR_AMOUNT_TOO_LARGE);
        }
        if self.description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(ERR_DESCRIPTION_TOO_LONG);
        }
        Ok(())
    }
}

/// Currency amounts carry at most two decimal places
pub fn is_valid_amount(amount: Decimal) -> bool {
    amount.normalize().scale() <= 2
}

pub fn within_max_amount(amount: Decimal) -> bool {
    amount <= Decimal::from(MAX_AMOUNT)
}

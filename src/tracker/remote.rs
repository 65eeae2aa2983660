use std::future::Future;

use crate::db::Db;
use crate::error::Result;
use crate::models::{BudgetLimit, BudgetLimitUpdate, Expense, NewBudgetLimit, NewExpense};
use crate::store::{budget_limits, expenses, run_blocking};

/// Remote CRUD over expenses and budget limits, scoped by owner id
///
/// Every operation resolves to an error on failure; callers decide how to
/// surface it.
pub trait RemoteApi {
    fn fetch_expenses(&self, user_id: &str) -> impl Future<Output = Result<Vec<Expense>>> + Send;

    fn add_expense(
        &self,
        user_id: &str,
        expense: NewExpense,
    ) -> impl Future<Output = Result<Expense>> + Send;

    fn update_expense(
        &self,
        user_id: &str,
        expense: &Expense,
    ) -> impl Future<Output = Result<Expense>> + Send;

    fn delete_expense(
        &self,
        user_id: &str,
        expense_id: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    fn fetch_budget_limits(
        &self,
        user_id: &str,
    ) -> impl Future<Output = Result<Vec<BudgetLimit>>> + Send;

    fn add_budget_limit(
        &self,
        user_id: &str,
        limit: NewBudgetLimit,
    ) -> impl Future<Output = Result<BudgetLimit>> + Send;

    fn update_budget_limit(
        &self,
        user_id: &str,
        limit: &BudgetLimit,
    ) -> impl Future<Output = Result<BudgetLimit>> + Send;

    fn delete_budget_limit(
        &self,
        user_id: &str,
        limit_id: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// [`RemoteApi`] served straight from the redb store
#[derive(Clone)]
pub struct DbApi {
    db: Db,
}

impl DbApi {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl RemoteApi for DbApi {
    async fn fetch_expenses(&self, user_id: &str) -> Result<Vec<Expense>> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |db| expenses::fetch_user_expenses(db, &user_id)).await
    }

    async fn add_expense(&self, user_id: &str, expense: NewExpense) -> Result<Expense> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |db| expenses::add_expense(db, &user_id, expense)).await
    }

    async fn update_expense(&self, user_id: &str, expense: &Expense) -> Result<Expense> {
        let user_id = user_id.to_string();
        let expense_id = expense.id.clone();
        let fields = expense.fields();
        run_blocking(&self.db, move |db| {
            expenses::update_expense(db, &user_id, &expense_id, fields)
        })
        .await
    }

    async fn delete_expense(&self, user_id: &str, expense_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        let expense_id = expense_id.to_string();
        run_blocking(&self.db, move |db| {
            expenses::delete_expense(db, &user_id, &expense_id)
        })
        .await
    }

    async fn fetch_budget_limits(&self, user_id: &str) -> Result<Vec<BudgetLimit>> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |db| {
            budget_limits::fetch_user_budget_limits(db, &user_id)
        })
        .await
    }

    async fn add_budget_limit(&self, user_id: &str, limit: NewBudgetLimit) -> Result<BudgetLimit> {
        let user_id = user_id.to_string();
        run_blocking(&self.db, move |db| {
            budget_limits::add_budget_limit(db, &user_id, limit)
        })
        .await
    }

    async fn update_budget_limit(&self, user_id: &str, limit: &BudgetLimit) -> Result<BudgetLimit> {
        let user_id = user_id.to_string();
        let limit_id = limit.id.clone();
        let update = BudgetLimitUpdate {
            amount: limit.amount,
            period: limit.period,
        };
        run_blocking(&self.db, move |db| {
            budget_limits::update_budget_limit(db, &user_id, &limit_id, update)
        })
        .await
    }

    async fn delete_budget_limit(&self, user_id: &str, limit_id: &str) -> Result<()> {
        let user_id = user_id.to_string();
        let limit_id = limit_id.to_string();
        run_blocking(&self.db, move |db| {
            budget_limits::delete_budget_limit(db, &user_id, &limit_id)
        })
        .await
    }
}

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::auth::AuthEvent;
use crate::budget::{budget_statuses, BudgetStatus, ExpenseSummary};
use crate::constants::*;
use crate::error::AppError;
use crate::models::{BudgetLimit, Expense, NewBudgetLimit, NewExpense};
use crate::tracker::{LocalStorage, RemoteApi, TrackerError};

/// Client-side expense state for one user session
///
/// Anonymous sessions keep expenses in [`LocalStorage`]; once a user is
/// signed in, every change goes through the [`RemoteApi`] and local storage
/// is left untouched.
pub struct ExpenseBook<R> {
    remote: R,
    storage: LocalStorage,
    user_id: Option<String>,
    expenses: Vec<Expense>,
    budget_limits: Vec<BudgetLimit>,
}

impl<R: RemoteApi> ExpenseBook<R> {
    /// Start an anonymous session, loading whatever local storage holds
    pub fn new(remote: R, storage: LocalStorage) -> Self {
        let mut book = Self {
            remote,
            storage,
            user_id: None,
            expenses: Vec::new(),
            budget_limits: Vec::new(),
        };
        book.expenses = book.load_local();
        book
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn budget_limits(&self) -> &[BudgetLimit] {
        &self.budget_limits
    }

    pub fn summary(&self) -> ExpenseSummary {
        ExpenseSummary::from_expenses(&self.expenses)
    }

    pub fn budget_statuses(&self) -> Vec<BudgetStatus> {
        budget_statuses(&self.budget_limits, &self.expenses)
    }

    /// Switch storage mode after an auth change notification
    pub async fn handle_auth_event(&mut self, event: &AuthEvent) -> Result<(), TrackerError> {
        match event {
            AuthEvent::SignedIn { user_id } => {
                if self.user_id.as_deref() == Some(user_id.as_str()) {
                    return Ok(());
                }
                self.set_user(Some(user_id.clone())).await
            }
            AuthEvent::SignedOut { user_id } => {
                if self.user_id.as_deref() != Some(user_id.as_str()) {
                    return Ok(());
                }
                self.set_user(None).await
            }
        }
    }

    /// Apply every auth notification queued on `events`
    pub async fn sync_auth_events(
        &mut self,
        events: &mut broadcast::Receiver<AuthEvent>,
    ) -> Result<(), TrackerError> {
        loop {
            match events.try_recv() {
                Ok(event) => self.handle_auth_event(&event).await?,
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} auth notifications", skipped);
                }
                Err(_) => return Ok(()),
            }
        }
    }

    /// Set the signed-in user (or none) and reload expenses and limits accordingly
    pub async fn set_user(&mut self, user_id: Option<String>) -> Result<(), TrackerError> {
        self.user_id = user_id;
        self.budget_limits.clear();

        let Some(user_id) = self.user_id.clone() else {
            self.expenses = self.load_local();
            return Ok(());
        };

        self.expenses.clear();
        self.expenses = self
            .remote
            .fetch_expenses(&user_id)
            .await
            .map_err(|e| fail(MSG_LOAD_EXPENSES, e))?;
        self.budget_limits = self
            .remote
            .fetch_budget_limits(&user_id)
            .await
            .map_err(|e| fail(MSG_LOAD_BUDGET_LIMITS, e))?;

        Ok(())
    }

    pub async fn add_expense(&mut self, expense: NewExpense) -> Result<Expense, TrackerError> {
        let Some(user_id) = self.user_id.clone() else {
            expense.validate().map_err(invalid)?;
            let local = Expense::local(Uuid::new_v4().to_string(), expense);
            self.expenses.push(local.clone());
            self.sort_expenses();
            self.save_local();
            return Ok(local);
        };

        let added = self
            .remote
            .add_expense(&user_id, expense)
            .await
            .map_err(|e| fail(MSG_ADD_EXPENSE, e))?;
        self.expenses.push(added.clone());
        self.sort_expenses();
        Ok(added)
    }

    pub async fn update_expense(&mut self, expense: Expense) -> Result<Expense, TrackerError> {
        let Some(user_id) = self.user_id.clone() else {
            expense.fields().validate().map_err(invalid)?;
            self.replace_expense(expense.clone());
            self.save_local();
            return Ok(expense);
        };

        let updated = self
            .remote
            .update_expense(&user_id, &expense)
            .await
            .map_err(|e| fail(MSG_UPDATE_EXPENSE, e))?;
        self.replace_expense(updated.clone());
        Ok(updated)
    }

    pub async fn delete_expense(&mut self, expense_id: &str) -> Result<(), TrackerError> {
        if let Some(user_id) = self.user_id.clone() {
            self.remote
                .delete_expense(&user_id, expense_id)
                .await
                .map_err(|e| fail(MSG_DELETE_EXPENSE, e))?;
            self.expenses.retain(|e| e.id != expense_id);
        } else {
            self.expenses.retain(|e| e.id != expense_id);
            self.save_local();
        }
        Ok(())
    }

    pub async fn add_budget_limit(
        &mut self,
        limit: NewBudgetLimit,
    ) -> Result<BudgetLimit, TrackerError> {
        let user_id = self.require_user()?;

        if self
            .budget_limits
            .iter()
            .any(|l| l.category == limit.category && l.period == limit.period)
        {
            let err = AppError::DuplicateBudgetLimit {
                category: limit.category,
                period: limit.period,
            };
            return Err(TrackerError::new(err.to_string(), Some(err)));
        }

        let added = self
            .remote
            .add_budget_limit(&user_id, limit)
            .await
            .map_err(|e| fail(MSG_ADD_BUDGET_LIMIT, e))?;
        self.budget_limits.push(added.clone());
        self.sort_budget_limits();
        Ok(added)
    }

    pub async fn update_budget_limit(
        &mut self,
        limit: BudgetLimit,
    ) -> Result<BudgetLimit, TrackerError> {
        let user_id = self.require_user()?;

        let updated = self
            .remote
            .update_budget_limit(&user_id, &limit)
            .await
            .map_err(|e| fail(MSG_UPDATE_BUDGET_LIMIT, e))?;
        if let Some(slot) = self.budget_limits.iter_mut().find(|l| l.id == updated.id) {
            *slot = updated.clone();
        }
        self.sort_budget_limits();
        Ok(updated)
    }

    pub async fn delete_budget_limit(&mut self, limit_id: &str) -> Result<(), TrackerError> {
        let user_id = self.require_user()?;

        self.remote
            .delete_budget_limit(&user_id, limit_id)
            .await
            .map_err(|e| fail(MSG_DELETE_BUDGET_LIMIT, e))?;
        self.budget_limits.retain(|l| l.id != limit_id);
        Ok(())
    }

    fn require_user(&self) -> Result<String, TrackerError> {
        self.user_id
            .clone()
            .ok_or_else(|| TrackerError::new(MSG_SIGN_IN_REQUIRED, None))
    }

    fn replace_expense(&mut self, expense: Expense) {
        match self.expenses.iter_mut().find(|e| e.id == expense.id) {
            Some(slot) => *slot = expense,
            None => tracing::debug!("Update for unknown expense {}", expense.id),
        }
        self.sort_expenses();
    }

    fn sort_expenses(&mut self) {
        self.expenses.sort_by(|a, b| b.date.cmp(&a.date));
    }

    fn sort_budget_limits(&mut self) {
        self.budget_limits.sort_by(|a, b| {
            a.category
                .as_str()
                .cmp(b.category.as_str())
                .then(a.period.cmp(&b.period))
        });
    }

    fn load_local(&self) -> Vec<Expense> {
        let Some(raw) = self.storage.get_item(EXPENSES_STORAGE_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(raw) {
            Ok(expenses) => expenses,
            Err(e) => {
                tracing::warn!("Discarding unreadable local expenses: {}", e);
                Vec::new()
            }
        }
    }

    fn save_local(&mut self) {
        let serialized = match serde_json::to_string(&self.expenses) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Failed to serialize local expenses: {}", e);
                return;
            }
        };
        if let Err(e) = self.storage.set_item(EXPENSES_STORAGE_KEY, serialized) {
            tracing::warn!("Failed to write local expenses: {}", e);
        }
    }
}

/// Log a remote failure and wrap it with its user-facing message
///
/// Rejections the user can act on keep their own message.
fn fail(message: &'static str, err: AppError) -> TrackerError {
    tracing::error!("{}: {}", message, err);
    match err {
        AppError::DuplicateBudgetLimit { .. } => TrackerError::new(err.to_string(), Some(err)),
        AppError::InvalidInput(reason) => {
            TrackerError::new(reason.clone(), Some(AppError::InvalidInput(reason)))
        }
        err => TrackerError::new(message, Some(err)),
    }
}

fn invalid(reason: &'static str) -> TrackerError {
    TrackerError::new(reason, Some(AppError::InvalidInput(reason.to_string())))
}

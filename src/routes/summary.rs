use axum::{extract::State, Json};

use crate::budget::{budget_statuses, BudgetStatus, ExpenseSummary, WarningLevel};
use crate::error::Result;
use crate::routes::AuthUser;
use crate::store::{budget_limits, expenses, run_blocking};
use crate::AppState;

/// Total, current-month total and average of the user's expenses
///
/// GET /api/summary
pub async fn expense_summary(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ExpenseSummary>> {
    let user_id = auth.user.id;
    let list =
        run_blocking(&state.db, move |db| expenses::fetch_user_expenses(db, &user_id)).await?;
    Ok(Json(ExpenseSummary::from_expenses(&list)))
}

/// Spend and warning level for every budget limit in its current window
///
/// GET /api/budget-status
pub async fn budget_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<BudgetStatus>>> {
    let user_id = auth.user.id;
    let (limits, list) = run_blocking(&state.db, move |db| {
        let limits = budget_limits::fetch_user_budget_limits(db, &user_id)?;
        let list = expenses::fetch_user_expenses(db, &user_id)?;
        Ok((limits, list))
    })
    .await?;

    let statuses = budget_statuses(&limits, &list);
    for status in statuses
        .iter()
        .filter(|s| s.warning_level != WarningLevel::None)
    {
        tracing::debug!(
            "Budget {} {} at {}%: {}",
            status.limit.period,
            status.limit.category,
            status.percentage,
            status.label
        );
    }
    Ok(Json(statuses))
}

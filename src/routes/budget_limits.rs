use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::Result;
use crate::models::{BudgetLimit, BudgetLimitUpdate, NewBudgetLimit};
use crate::routes::AuthUser;
use crate::store::{budget_limits, run_blocking};
use crate::AppState;

/// GET /api/budget-limits
pub async fn list_budget_limits(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<BudgetLimit>>> {
    let user_id = auth.user.id;
    let limits = run_blocking(&state.db, move |db| {
        budget_limits::fetch_user_budget_limits(db, &user_id)
    })
    .await?;
    Ok(Json(limits))
}

/// Create a limit
///
/// POST /api/budget-limits
///
/// Returns 409 Conflict if the user already has a limit for the same
/// category and period.
pub async fn create_budget_limit(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewBudgetLimit>,
) -> Result<(StatusCode, Json<BudgetLimit>)> {
    let user_id = auth.user.id;
    let limit = run_blocking(&state.db, move |db| {
        budget_limits::add_budget_limit(db, &user_id, payload)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(limit)))
}

/// PUT /api/budget-limits/:id
pub async fn update_budget_limit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(limit_id): Path<String>,
    Json(payload): Json<BudgetLimitUpdate>,
) -> Result<Json<BudgetLimit>> {
    let user_id = auth.user.id;
    let limit = run_blocking(&state.db, move |db| {
        budget_limits::update_budget_limit(db, &user_id, &limit_id, payload)
    })
    .await?;
    Ok(Json(limit))
}

/// DELETE /api/budget-limits/:id
pub async fn delete_budget_limit(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(limit_id): Path<String>,
) -> Result<StatusCode> {
    let user_id = auth.user.id;
    run_blocking(&state.db, move |db| {
        budget_limits::delete_budget_limit(db, &user_id, &limit_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

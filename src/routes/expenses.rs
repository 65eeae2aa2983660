use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::error::Result;
use crate::models::{Expense, NewExpense};
use crate::routes::AuthUser;
use crate::store::{expenses, run_blocking};
use crate::AppState;

/// All expenses of the signed-in user, newest first
///
/// GET /api/expenses
pub async fn list_expenses(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Expense>>> {
    let user_id = auth.user.id;
    let list =
        run_blocking(&state.db, move |db| expenses::fetch_user_expenses(db, &user_id)).await?;
    Ok(Json(list))
}

/// POST /api/expenses
pub async fn create_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewExpense>,
) -> Result<(StatusCode, Json<Expense>)> {
    let user_id = auth.user.id;
    let expense =
        run_blocking(&state.db, move |db| expenses::add_expense(db, &user_id, payload)).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// Replace amount, category, description and date
///
/// PUT /api/expenses/:id
pub async fn update_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<String>,
    Json(payload): Json<NewExpense>,
) -> Result<Json<Expense>> {
    let user_id = auth.user.id;
    let expense = run_blocking(&state.db, move |db| {
        expenses::update_expense(db, &user_id, &expense_id, payload)
    })
    .await?;
    Ok(Json(expense))
}

/// DELETE /api/expenses/:id
pub async fn delete_expense(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(expense_id): Path<String>,
) -> Result<StatusCode> {
    let user_id = auth.user.id;
    run_blocking(&state.db, move |db| {
        expenses::delete_expense(db, &user_id, &expense_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub mod auth;
pub mod budget_limits;
pub mod expenses;
pub mod health;
pub mod summary;

pub use auth::{current_session, get_profile, sign_in, sign_out, sign_up, AuthUser};
pub use budget_limits::{
    create_budget_limit, delete_budget_limit, list_budget_limits, update_budget_limit,
};
pub use expenses::{create_expense, delete_expense, list_expenses, update_expense};
pub use health::health_check;
pub use summary::{budget_status, expense_summary};

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::AppState;

/// Build the application router without transport layers (CORS, tracing)
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
        .route("/auth/session", get(current_session))
        .route("/api/profile", get(get_profile))
        .route("/api/expenses", get(list_expenses).post(create_expense))
        .route(
            "/api/expenses/:id",
            put(update_expense).delete(delete_expense),
        )
        .route(
            "/api/budget-limits",
            get(list_budget_limits).post(create_budget_limit),
        )
        .route(
            "/api/budget-limits/:id",
            put(update_budget_limit).delete(delete_budget_limit),
        )
        .route("/api/summary", get(expense_summary))
        .route("/api/budget-status", get(budget_status))
        .with_state(state)
}

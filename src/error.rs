use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::models::{BudgetPeriod, Category};

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] redb::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::error::EncodeError),

    #[error("Deserialization error: {0}")]
    Deserialization(#[from] bincode::error::DecodeError),

    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] bcrypt::BcryptError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Expense not found")]
    ExpenseNotFound,

    #[error("Budget limit not found")]
    BudgetLimitNotFound,

    #[error("Profile not found")]
    ProfileNotFound,

    #[error("A {period} budget limit for {category} already exists")]
    DuplicateBudgetLimit {
        category: Category,
        period: BudgetPeriod,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// True for failures of the storage layer rather than of the request
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AppError::Database(_)
                | AppError::Transaction(_)
                | AppError::Table(_)
                | AppError::Storage(_)
                | AppError::Commit(_)
                | AppError::Serialization(_)
                | AppError::Deserialization(_)
                | AppError::TaskJoin(_)
                | AppError::PasswordHash(_)
        )
    }
}

/// Implement IntoResponse to convert AppError into HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.is_internal() {
            tracing::error!("{}: {:?}", self, self);
            let body = Json(json!({ "error": "Internal server error" }));
            return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
        }

        let status = match self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::EmailAlreadyRegistered => StatusCode::CONFLICT,
            AppError::DuplicateBudgetLimit { .. } => StatusCode::CONFLICT,
            AppError::ExpenseNotFound => StatusCode::NOT_FOUND,
            AppError::BudgetLimitNotFound => StatusCode::NOT_FOUND,
            AppError::ProfileNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let error_message = match self {
            AppError::InvalidInput(msg) => msg,
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;

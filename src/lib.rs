//! Budget Tracker Library
//!
//! Expenses, budget limits and profiles per user, served over HTTP, plus an
//! expense book that keeps anonymous data in local storage.

pub mod auth;
pub mod budget;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod format;
pub mod models;
pub mod routes;
pub mod security;
pub mod store;
pub mod tracker;

pub use auth::{AuthClient, AuthEvent, AuthService};
pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};
pub use routes::create_router;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub auth: AuthService,
}

impl AppState {
    /// Create a new AppState with the given database and configuration
    pub fn new(db: Db, config: Config) -> Self {
        let auth = AuthService::new(
            db.clone(),
            config.session_secret.clone(),
            config.session_ttl_secs,
            config.bcrypt_cost,
        );
        Self { db, config, auth }
    }
}

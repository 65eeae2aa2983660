use axum::{extract::State, Json};
use serde::Serialize;

use crate::db::tables;
use crate::store::run_blocking;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub database: &'static str,
    pub version: &'static str,
}

/// Liveness plus a read of the expense table
///
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthStatus> {
    let check = run_blocking(&state.db, |db| {
        let read_txn = db.begin_read()?;
        read_txn.open_table(tables::EXPENSES)?;
        Ok(())
    })
    .await;

    let (status, database) = match check {
        Ok(()) => ("healthy", "connected"),
        Err(e) => {
            tracing::error!("Database health check failed: {}", e);
            ("unhealthy", "disconnected")
        }
    };

    Json(HealthStatus {
        status,
        database,
        version: env!("CARGO_PKG_VERSION"),
    })
}

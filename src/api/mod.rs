//! REST API for settlement state and grid telemetry.
//!
//! Provides two GET endpoints:
//! - `/state`: settlement summary, KPI report, and latest tick
//! - `/telemetry`: full tick reports with optional range filtering

mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;

pub use types::{BuildingSummary, SettlementSummary, TelemetryRecord};

use crate::grid::TickReport;
use crate::grid::kpi::KpiReport;

/// Immutable application state shared across all request handlers.
///
/// Constructed once after the run completes and wrapped in `Arc`; all data
/// is read-only so no locks are needed.
pub struct AppState {
    /// Settlement as it stood at the end of the run.
    pub settlement: SettlementSummary,
    /// Aggregate KPI report.
    pub kpi: KpiReport,
    /// Per-tick grid reports.
    pub reports: Vec<TickReport>,
}

/// Builds the axum router with all API routes.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/telemetry", get(handlers::get_telemetry))
        .with_state(state)
}

/// Binds to the given address and serves the API.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app).await
}

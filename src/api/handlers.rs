//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, StateResponse, TelemetryQuery, TelemetryRecord};

/// Returns the settlement summary, KPI report, and latest telemetry record.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    Json(StateResponse {
        settlement: state.settlement.clone(),
        kpi: state.kpi.clone(),
        latest_tick: state.reports.last().map(TelemetryRecord::from),
    })
}

/// Returns telemetry records, optionally filtered by tick range.
///
/// `GET /telemetry` → 200 + `Vec<TelemetryRecord>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: format!("`from` ({from}) must be <= `to` ({to})"),
            }),
        ));
    }

    let records: Vec<TelemetryRecord> = state
        .reports
        .iter()
        .filter(|r| r.tick >= from && r.tick <= to)
        .map(TelemetryRecord::from)
        .collect();

    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    use super::*;
    use crate::api::{SettlementSummary, router};
    use crate::config::ScenarioConfig;
    use crate::grid::kpi::KpiReport;
    use crate::scenario::build_engine;

    fn make_test_state(ticks: usize) -> Arc<AppState> {
        let mut cfg = ScenarioConfig::baseline();
        cfg.simulation.ticks = ticks;
        let mut engine = build_engine(&cfg).expect("baseline builds");
        let reports = engine.run();
        let kpi = KpiReport::from_results(&reports);
        Arc::new(AppState {
            settlement: SettlementSummary::from(engine.settlement()),
            kpi,
            reports,
        })
    }

    async fn get_json(state: Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        let app = router(state);
        let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn state_returns_200() {
        let (status, json) = get_json(make_test_state(24), "/state").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.get("settlement").is_some());
        assert!(json.get("kpi").is_some());
        assert_eq!(json["latest_tick"]["tick"], 23);
        assert_eq!(json["settlement"]["buildings"].as_array().map(Vec::len), Some(7));
    }

    #[tokio::test]
    async fn telemetry_returns_all_ticks() {
        let (status, json) = get_json(make_test_state(24), "/telemetry").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().map(Vec::len), Some(24));
    }

    #[tokio::test]
    async fn telemetry_range_query() {
        let (status, json) = get_json(make_test_state(24), "/telemetry?from=5&to=10").await;
        assert_eq!(status, StatusCode::OK);
        let records = json.as_array().cloned().unwrap_or_default();
        assert_eq!(records.len(), 6); // ticks 5,6,7,8,9,10
        assert_eq!(records[0]["tick"], 5);
        assert_eq!(records[5]["tick"], 10);
    }

    #[tokio::test]
    async fn telemetry_invalid_range_returns_400() {
        let (status, json) = get_json(make_test_state(4), "/telemetry?from=10&to=5").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("error").is_some());
    }
}

use crate::db::HealthReport;
use crate::server::router::ForgeState;
use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

pub fn router() -> Router<ForgeState> {
    Router::new().route("/health", get(health_handler))
}

/// 200 when the record store answered, 503 otherwise. The body is the report
/// either way.
pub async fn health_handler(State(state): State<ForgeState>) -> (StatusCode, Json<HealthReport>) {
    let report = state.pages.health().await;
    let status = if report.connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report))
}

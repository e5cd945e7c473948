// Driving adapter - HTTP surface over the user lifecycle coordinator

pub mod error;
pub mod middleware;
pub mod users;

use std::time::Duration;

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::infrastructure::AppState;

pub use users::user_routes;

/// Full application router. Requests running past `request_timeout` are
/// dropped, abandoning any remote call still in flight.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/api/v1/user", user_routes())
        .route("/health", get(health_check))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

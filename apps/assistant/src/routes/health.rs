use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};

use crate::state::AppState;

const CHAT_PAGE: &str = include_str!("../../static/index.html");

/// GET /health and GET /api/v1/health
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// GET /
/// The chat page in web mode, otherwise a service banner.
pub async fn index_handler(State(state): State<AppState>) -> Response {
    if state.web_ui {
        Html(CHAT_PAGE).into_response()
    } else {
        Json(json!({
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "status": "running"
        }))
        .into_response()
    }
}

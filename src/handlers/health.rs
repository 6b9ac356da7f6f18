use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};

use crate::context::AppContext;

/// GET /health - store connectivity and key mode
pub async fn health(State(ctx): State<AppContext>) -> (StatusCode, Json<Value>) {
    let now = chrono::Utc::now();
    let ephemeral_keys = ctx.keys().is_ephemeral();

    match ctx.store().ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "store": "ok",
                    "ephemeral_keys": ephemeral_keys
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "store unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "store_error": e.to_string()
                }
            })),
        ),
    }
}

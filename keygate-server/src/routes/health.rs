//! Liveness and readiness endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::oauth::OauthProvider;
use crate::state::AppState;
use crate::store::{RevocationLedger, UserStore};

/// GET /health
/// Basic check that the process is alive
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "alive" }))
}

/// GET /readiness
/// Deep check that the backing store is reachable
pub async fn readiness<U, L, P>(State(state): State<Arc<AppState<U, L, P>>>) -> Response
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    match state.users.ping() {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ready" }))).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable" })),
            )
                .into_response()
        }
    }
}

//! Standard response envelope

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;

/// Success envelope shared by every enveloped JSON endpoint.
pub fn success<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (
        status,
        axum::Json(json!({
            "status": "success",
            "status_code": status.as_u16(),
            "message": message,
            "data": data,
        })),
    )
        .into_response()
}

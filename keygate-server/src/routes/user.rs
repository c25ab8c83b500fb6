//! User endpoints, guarded by the bearer access token

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::oauth::OauthProvider;
use crate::response::success;
use crate::state::AppState;
use crate::store::{RevocationLedger, UserStore, UserView};

/// Pull the bearer access token out of the Authorization header
fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| ApiError::InvalidToken("missing bearer token".to_string()))
}

/// GET /api/v1/users/me
pub async fn me<U, L, P>(
    State(state): State<Arc<AppState<U, L, P>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    let user = state.sessions.authenticate(bearer_token(&headers)?)?;

    Ok(success(
        StatusCode::OK,
        "User details retrieved successfully",
        json!({ "user": UserView::from(&user) }),
    ))
}

/// DELETE /api/v1/users/me
pub async fn delete_me<U, L, P>(
    State(state): State<Arc<AppState<U, L, P>>>,
    headers: HeaderMap,
) -> Result<Response, ApiError>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    let user = state.sessions.authenticate(bearer_token(&headers)?)?;
    state.users.mark_deleted(user.id)?;

    tracing::info!(user = %user.id, "account soft-deleted");
    Ok(success(StatusCode::OK, "User deleted successfully", json!({})))
}

/// GET /api/v1/users/{user_id}
pub async fn get_by_id<U, L, P>(
    State(state): State<Arc<AppState<U, L, P>>>,
    headers: HeaderMap,
    Path(user_id): Path<String>,
) -> Result<Response, ApiError>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    state.sessions.authenticate(bearer_token(&headers)?)?;

    let id = Uuid::parse_str(&user_id).map_err(|_| ApiError::NotFound)?;
    let user = state.users.find_by_id(id)?.ok_or(ApiError::NotFound)?;

    Ok(success(
        StatusCode::OK,
        "User details retrieved successfully",
        json!({ "user": UserView::from(&user) }),
    ))
}

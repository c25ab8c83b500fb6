//! Authentication endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::error::ApiError;
use crate::oauth::OauthProvider;
use crate::response::success;
use crate::state::AppState;
use crate::store::{RevocationLedger, UserStore, UserView};

pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/register
pub async fn register<U, L, P>(
    State(state): State<Arc<AppState<U, L, P>>>,
    cookies: Cookies,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, ApiError>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    let session = state.sessions.register(&req.email, &req.password)?;

    set_refresh_cookie(
        &cookies,
        &session.tokens.refresh,
        state.config.refresh_cookie_days,
        SameSite::Lax,
    );

    Ok(success(
        StatusCode::CREATED,
        "User created successfully",
        json!({
            "user": UserView::from(&session.user),
            "access_token": session.tokens.access,
        }),
    ))
}

/// POST /api/v1/auth/login
pub async fn login<U, L, P>(
    State(state): State<Arc<AppState<U, L, P>>>,
    cookies: Cookies,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    let session = state.sessions.login(&req.email, &req.password)?;

    set_refresh_cookie(
        &cookies,
        &session.tokens.refresh,
        state.config.refresh_cookie_days,
        SameSite::Lax,
    );

    Ok(success(
        StatusCode::OK,
        "Login successful",
        json!({
            "user": UserView::from(&session.user),
            "access_token": session.tokens.access,
        }),
    ))
}

/// POST /api/v1/auth/refresh-access-token
pub async fn refresh_access_token<U, L, P>(
    State(state): State<Arc<AppState<U, L, P>>>,
    cookies: Cookies,
) -> Result<Response, ApiError>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    let current = cookies
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::InvalidToken("missing refresh cookie".to_string()))?;

    let pair = state.sessions.refresh(&current)?;

    set_refresh_cookie(
        &cookies,
        &pair.refresh,
        state.config.refresh_cookie_days,
        SameSite::Lax,
    );

    Ok(success(
        StatusCode::OK,
        "Tokens refreshed successfully",
        json!({
            "access_token": {
                "token": pair.access,
                "token_type": "access",
            },
        }),
    ))
}

/// POST /api/v1/auth/logout
///
/// Succeeds with or without a refresh cookie.
pub async fn logout<U, L, P>(
    State(state): State<Arc<AppState<U, L, P>>>,
    cookies: Cookies,
) -> Result<Response, ApiError>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    let current = cookies.get(REFRESH_COOKIE).map(|c| c.value().to_string());
    state.sessions.logout(current.as_deref())?;

    clear_refresh_cookie(&cookies);

    Ok(success(
        StatusCode::OK,
        "User logged out successfully",
        json!({}),
    ))
}

/// Helper to set the refresh cookie
pub fn set_refresh_cookie(cookies: &Cookies, token: &str, days: i64, same_site: SameSite) {
    let cookie = Cookie::build((REFRESH_COOKIE, token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(same_site)
        .max_age(Duration::days(days))
        .build();
    cookies.add(cookie);
}

/// Helper to clear the refresh cookie
pub fn clear_refresh_cookie(cookies: &Cookies) {
    let cookie = Cookie::build((REFRESH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(true)
        .max_age(Duration::ZERO)
        .build();
    cookies.add(cookie);
}

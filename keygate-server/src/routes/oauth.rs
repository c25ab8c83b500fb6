//! Federated login endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tower_cookies::cookie::time::Duration;
use tower_cookies::cookie::SameSite;
use tower_cookies::{Cookie, Cookies};

use crate::config::Environment;
use crate::error::ApiError;
use crate::oauth::{OauthProvider, OauthState};
use crate::response::success;
use crate::state::AppState;
use crate::store::{RevocationLedger, UserStore, UserView};

use super::auth::set_refresh_cookie;

#[derive(Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

/// POST /api/v1/oauth/google
/// Direct login with a provider-issued ID token.
pub async fn google_login<U, L, P>(
    State(state): State<Arc<AppState<U, L, P>>>,
    cookies: Cookies,
    Json(req): Json<GoogleLoginRequest>,
) -> Result<Response, ApiError>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    let claims = state.oauth()?.fetch_claims(&req.id_token).await?;
    let (user, created) = state.reconciler.resolve_or_create(&claims)?;
    let session = state.sessions.for_user(user)?;

    set_refresh_cookie(
        &cookies,
        &session.tokens.refresh,
        state.config.refresh_cookie_days,
        SameSite::Lax,
    );

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok(success(
        status,
        "Login successful",
        json!({
            "user": UserView::from(&session.user),
            "access_token": session.tokens.access,
        }),
    ))
}

#[derive(Deserialize)]
pub struct InitiateParams {
    pub environment: Option<String>,
    #[serde(default)]
    pub return_json: bool,
}

/// GET /api/v1/oauth/google/initiate
pub async fn initiate<U, L, P>(
    State(state): State<Arc<AppState<U, L, P>>>,
    Query(params): Query<InitiateParams>,
) -> Result<Response, ApiError>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    let oauth = state.oauth()?;

    let env: Environment = params
        .environment
        .as_deref()
        .ok_or_else(|| ApiError::Initiation("environment parameter not included".to_string()))?
        .parse()
        .map_err(|_| ApiError::Initiation("unknown environment".to_string()))?;

    let state_token = OauthState::new(env).encode(state.config.access_secret.as_bytes())?;
    let auth_url = oauth.authorization_url(&state_token)?;

    if params.return_json {
        let redirect_uri = state
            .config
            .google
            .as_ref()
            .map(|g| g.redirect_uri.clone())
            .unwrap_or_default();
        return Ok(success(
            StatusCode::OK,
            "Google OAuth URL generated",
            json!({
                "auth_url": auth_url,
                "state": state_token,
                "redirect_uri": redirect_uri,
            }),
        ));
    }

    Ok(found(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    #[serde(default)]
    pub state: String,
}

/// GET /api/v1/oauth/google/callback
///
/// Browser-facing: the caller is mid-redirect, so every failure degrades to
/// a redirect carrying `auth_success=false` rather than an error body.
pub async fn callback<U, L, P>(
    State(state): State<Arc<AppState<U, L, P>>>,
    cookies: Cookies,
    Query(params): Query<CallbackParams>,
) -> Response
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    // Unverifiable state falls back to this process's own environment.
    let env = OauthState::decode(&params.state, state.config.access_secret.as_bytes())
        .unwrap_or(state.config.env);
    let frontend = state.config.frontend_url(env).to_string();

    let code = match params.code {
        Some(code) => code,
        None => return found(&frontend),
    };

    match complete_login(&state, &cookies, &code).await {
        Ok((access_token, id_token)) => found(&format!(
            "{}/auth/callback?auth_success=true&access_token={}&id_token={}",
            frontend, access_token, id_token
        )),
        Err(err) => {
            tracing::error!(error = %err, "google callback failed");
            found(&format!("{}/auth/callback?auth_success=false", frontend))
        }
    }
}

async fn complete_login<U, L, P>(
    state: &AppState<U, L, P>,
    cookies: &Cookies,
    code: &str,
) -> Result<(String, String), ApiError>
where
    U: UserStore,
    L: RevocationLedger,
    P: OauthProvider,
{
    let oauth = state.oauth()?;
    let id_token = oauth.exchange_code(code).await?;
    let claims = oauth.fetch_claims(&id_token).await?;

    let (user, _) = state.reconciler.resolve_or_create(&claims)?;
    let session = state.sessions.for_user(user)?;

    // The redirect target is cross-site, so these cookies need SameSite=None.
    set_refresh_cookie(
        cookies,
        &session.tokens.refresh,
        state.config.refresh_cookie_days,
        SameSite::None,
    );
    set_id_token_cookie(cookies, &id_token);

    Ok((session.tokens.access, id_token))
}

fn set_id_token_cookie(cookies: &Cookies, id_token: &str) {
    let cookie = Cookie::build(("id_token", id_token.to_string()))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(Duration::hours(1))
        .build();
    cookies.add(cookie);
}

/// 302 redirect, as browsers expect from an OAuth callback
fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        [(header::LOCATION, location.to_string())],
    )
        .into_response()
}

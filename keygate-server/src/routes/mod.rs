//! HTTP routes for the server

mod auth;
mod health;
mod oauth;
mod user;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::oauth::OauthProvider;
use crate::state::AppState;
use crate::store::{RevocationLedger, UserStore};

/// Create the router with all routes
pub fn create_router<U, L, P>(state: Arc<AppState<U, L, P>>) -> Router
where
    U: UserStore + 'static,
    L: RevocationLedger + 'static,
    P: OauthProvider + 'static,
{
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::health))
        .route("/readiness", get(health::readiness))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route(
            "/api/v1/auth/refresh-access-token",
            post(auth::refresh_access_token),
        )
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/oauth/google", post(oauth::google_login))
        .route("/api/v1/oauth/google/initiate", get(oauth::initiate))
        .route("/api/v1/oauth/google/callback", get(oauth::callback))
        .route("/api/v1/users/me", get(user::me).delete(user::delete_me))
        .route("/api/v1/users/:user_id", get(user::get_by_id))
        .layer(CookieManagerLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

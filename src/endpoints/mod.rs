pub mod account;
pub mod auth;
pub mod cloudflare;
pub mod docker;
pub mod hostnames;
pub mod pages;

use axum::{middleware as axum_middleware, routing::get, Json, Router};
use serde::Serialize;

use crate::application::response::ApiResponse;
use crate::middleware::{require_session, security_headers};
use crate::state::AppState;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/api/health", get(health_check))
        .nest("/api/auth", auth::auth_routes(state.clone()))
        .merge(pages::public_page_routes(state.clone()));

    // Protected routes (session required)
    let protected_routes = Router::new()
        .nest("/api", api_routes(state.clone()))
        .merge(pages::page_routes(&state.web_dir))
        .layer(axum_middleware::from_fn_with_state(
            state,
            require_session,
        ));

    public_routes
        .merge(protected_routes)
        .layer(axum_middleware::from_fn(security_headers))
}

/// API routes under /api/* (protected by the session middleware)
fn api_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/status",
            get(account::get_status).with_state(state.clone()),
        )
        .nest("/current-account", account::account_routes(state.clone()))
        .nest("/cloudflare", cloudflare::cloudflare_routes(state.clone()))
        .nest("/docker", docker::docker_routes(state))
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub version: &'static str,
}

async fn health_check() -> Json<ApiResponse<Health>> {
    Json(ApiResponse::ok(
        "OK",
        Health {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}

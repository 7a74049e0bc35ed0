use axum::{extract::State, routing::get, Extension, Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::response::ApiResponse;
use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedSession;
use crate::services::session::{CurrentAccount, Session};
use crate::state::AppState;

/// Current-account selection, mounted at `/api/current-account`
pub fn account_routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(get_current_account)
                .post(set_current_account)
                .delete(clear_current_account),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize, Validate)]
pub struct SelectAccountRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "account_id is required"))]
    pub account_id: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "account_name is required"))]
    pub account_name: String,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    pub username: String,
    pub current_account: Option<CurrentAccount>,
    pub cloudflare_configured: bool,
    pub docker_available: bool,
    pub active_sessions: usize,
    pub version: &'static str,
}

async fn get_current_account(
    Extension(AuthenticatedSession(session)): Extension<AuthenticatedSession>,
) -> Result<Json<ApiResponse<CurrentAccount>>> {
    let account = session
        .current_account
        .ok_or_else(|| AppError::NotFound("No account selected".to_string()))?;
    Ok(Json(ApiResponse::ok("Current account", account)))
}

async fn set_current_account(
    State(state): State<AppState>,
    Extension(AuthenticatedSession(session)): Extension<AuthenticatedSession>,
    Json(request): Json<SelectAccountRequest>,
) -> Result<Json<ApiResponse<CurrentAccount>>> {
    request.validate()?;

    let account = CurrentAccount {
        id: request.account_id.trim().to_string(),
        name: request.account_name.trim().to_string(),
        selected_at: Utc::now(),
    };
    state
        .sessions
        .update(&session.token, &mut |s: &mut Session| {
            s.current_account = Some(account.clone())
        })
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;
    tracing::info!("Selected Cloudflare account {}", account.id);

    Ok(Json(ApiResponse::ok("Account selected", account)))
}

async fn clear_current_account(
    State(state): State<AppState>,
    Extension(AuthenticatedSession(session)): Extension<AuthenticatedSession>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .sessions
        .update(&session.token, &mut |s: &mut Session| s.current_account = None)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;
    Ok(Json(ApiResponse::message("Account selection cleared")))
}

/// Overview for the dashboard header, mounted at `/api/status`
pub async fn get_status(
    State(state): State<AppState>,
    Extension(AuthenticatedSession(session)): Extension<AuthenticatedSession>,
) -> Json<ApiResponse<StatusResponse>> {
    Json(ApiResponse::ok(
        "Status",
        StatusResponse {
            authenticated: true,
            username: session.username,
            current_account: session.current_account,
            cloudflare_configured: state.cloudflare.is_some(),
            docker_available: state.docker.is_some(),
            active_sessions: state.sessions.len(),
            version: env!("CARGO_PKG_VERSION"),
        },
    ))
}

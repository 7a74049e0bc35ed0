use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::response::ApiResponse;
use crate::error::{AppError, Result};
use crate::middleware::auth::{extract_session_token, SESSION_COOKIE};
use crate::services::session::Session;
use crate::state::AppState;

/// Seven days, matching the cookie lifetime browsers keep
const SESSION_COOKIE_MAX_AGE: u32 = 604_800;

/// Create auth routes for session management
pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session_info))
        .with_state(state)
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

impl LoginRequest {
    /// Whitespace-only usernames count as missing
    fn trimmed(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            ..self
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub username: String,
}

#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub username: Option<String>,
}

// ============================================================================
// Session Cookie Helpers
// ============================================================================

/// Create a session cookie with the given token
pub(crate) fn create_session_cookie(token: &str, secure: bool) -> HeaderValue {
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        SESSION_COOKIE,
        token,
        SESSION_COOKIE_MAX_AGE,
        if secure { "; Secure" } else { "" }
    );
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Create a cookie that expires the session immediately
pub(crate) fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "session_token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT",
    )
}

/// Length-independent comparison so a wrong guess does not leak a prefix match
fn secret_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let mut diff = a.len() ^ b.len();
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    diff == 0
}

/// Remove the caller's session, if any
pub(crate) fn end_session(state: &AppState, headers: &HeaderMap) {
    if let Some(token) = extract_session_token(headers) {
        if state.sessions.delete(&token) {
            tracing::info!("Session ended");
        }
    }
}

// ============================================================================
// Session Management Endpoints
// ============================================================================

/// Check the admin credentials and start a session
async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Response> {
    let request = request.trimmed();
    request.validate()?;

    let username_ok = secret_eq(&request.username, &state.auth.admin_username);
    let password_ok = secret_eq(&request.password, &state.auth.admin_password);
    if !(username_ok && password_ok) {
        tracing::warn!("Failed login attempt for user {}", request.username);
        return Err(AppError::Unauthorized("Invalid username or password".to_string()));
    }

    let swept = state.sessions.sweep_expired();
    if swept > 0 {
        tracing::debug!("Swept {} expired session(s)", swept);
    }

    let session = Session::new(&state.auth.admin_username);
    let cookie = create_session_cookie(&session.token, state.auth.cookie_secure);
    let username = session.username.clone();
    state.sessions.set(session);
    tracing::info!("User {} logged in", username);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::ok("Login successful", LoginResponse { username })),
    )
        .into_response())
}

/// Drop the session and expire the cookie
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    end_session(&state, &headers);

    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(ApiResponse::message("Logged out")),
    )
        .into_response()
}

/// Whether the cookie maps to a live session
async fn session_info(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Json<ApiResponse<SessionInfo>> {
    let session = extract_session_token(&headers).and_then(|t| state.sessions.get(&t).ok());

    Json(ApiResponse::ok(
        "Session status",
        SessionInfo {
            authenticated: session.is_some(),
            username: session.map(|s| s.username),
        },
    ))
}

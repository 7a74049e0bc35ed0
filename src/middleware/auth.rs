//! Session authentication middleware
//!
//! Resolves the `session_token` cookie against the session store. API routes
//! get a 401 envelope when that fails; HTML pages are redirected to `/login`.

use axum::{
    extract::{OriginalUri, Request, State},
    http::{header::COOKIE, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};

use crate::application::response::ApiResponse;
use crate::services::session::Session;
use crate::state::AppState;

pub const SESSION_COOKIE: &str = "session_token";

/// Session of the caller, stored in request extensions
#[derive(Clone, Debug)]
pub struct AuthenticatedSession(pub Session);

pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    // Nested routers see a stripped path, so prefer the original one
    let is_api = req
        .extensions()
        .get::<OriginalUri>()
        .map(|uri| uri.path())
        .unwrap_or_else(|| req.uri().path())
        .starts_with("/api/");

    let token = match extract_session_token(req.headers()) {
        Some(t) => t,
        None => return reject(is_api, "Not authenticated"),
    };

    let session = match state.sessions.get(&token) {
        Ok(s) => s,
        Err(e) => return reject(is_api, &e.to_string()),
    };

    req.extensions_mut().insert(AuthenticatedSession(session));
    next.run(req).await
}

/// Extract the session token from the Cookie header
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|cookies| cookies.split(';'))
        .find_map(|cookie| {
            cookie
                .trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
                .map(str::to_string)
        })
        .filter(|token| !token.is_empty())
}

fn reject(is_api: bool, message: &str) -> Response {
    if is_api {
        unauthorized_response(message)
    } else {
        Redirect::to("/login").into_response()
    }
}

/// Create a 401 Unauthorized JSON response
fn unauthorized_response(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::<()>::failure(message)),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn headers(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    #[test]
    fn test_extract_single_cookie() {
        assert_eq!(
            extract_session_token(&headers("session_token=abc_20260101000000")),
            Some("abc_20260101000000".to_string())
        );
    }

    #[test]
    fn test_extract_among_other_cookies() {
        assert_eq!(
            extract_session_token(&headers("theme=dark; session_token=tok; lang=en")),
            Some("tok".to_string())
        );
    }

    #[test]
    fn test_similarly_named_cookie_is_ignored() {
        assert_eq!(
            extract_session_token(&headers("session_token_old=x")),
            None
        );
    }

    #[test]
    fn test_empty_or_missing_token() {
        assert_eq!(extract_session_token(&headers("session_token=")), None);
        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }
}

//! Dashboard HTML pages and static assets

use std::path::Path;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use tower_http::services::{ServeDir, ServeFile};

use crate::endpoints::auth::{clear_session_cookie, end_session};
use crate::state::AppState;

/// Session-protected pages: URL path -> file under the web directory
pub const PAGES: [(&str, &str); 9] = [
    ("/", "index.html"),
    ("/cloudflare/accounts", "cloudflare/accounts.html"),
    ("/cloudflare/tunnels", "cloudflare/tunnels.html"),
    ("/cloudflare/tunnels/create", "cloudflare/tunnel_create.html"),
    ("/cloudflare/tunnels/hostnames", "cloudflare/tunnel_hostnames.html"),
    ("/cloudflare/zones", "cloudflare/zones.html"),
    ("/cloudflare/zones/details", "cloudflare/zone_details.html"),
    ("/docker/containers", "docker/containers.html"),
    ("/docker/tunnels", "docker/tunnels.html"),
];

pub const LOGIN_PAGE: &str = "login.html";

/// Login page, logout redirect and `/assets`, reachable without a session
pub fn public_page_routes(state: AppState) -> Router {
    let web_dir = state.web_dir.clone();
    Router::new()
        .route_service("/login", ServeFile::new(web_dir.join(LOGIN_PAGE)))
        .route("/logout", get(logout_redirect))
        .nest_service("/assets", ServeDir::new(web_dir.join("assets")))
        .with_state(state)
}

/// Dashboard pages; the caller layers session enforcement on top
pub fn page_routes(web_dir: &Path) -> Router {
    PAGES
        .iter()
        .fold(Router::new(), |router, (path, file)| {
            router.route_service(path, ServeFile::new(web_dir.join(file)))
        })
}

/// End the session, expire the cookie and send the browser to the login page
async fn logout_redirect(State(state): State<AppState>, headers: HeaderMap) -> Response {
    end_session(&state, &headers);
    (
        [(header::SET_COOKIE, clear_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response()
}

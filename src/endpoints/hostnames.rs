//! Tunnel public hostname endpoints
//!
//! Responses carry both saga steps: the pushed ingress list and the DNS outcome.
//! A failed DNS step leaves the request successful and is described in the
//! message.

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use serde::Deserialize;
use validator::Validate;

use crate::application::response::ApiResponse;
use crate::error::Result;
use crate::services::hostnames::{HostnameChange, HostnameSync};
use crate::services::ingress::IngressRule;
use crate::state::AppState;

/// Hostname routes, merged into the Cloudflare router before state is attached
pub fn hostname_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/accounts/{account_id}/tunnels/{tunnel_id}/hostnames",
            get(list_hostnames).post(create_hostname),
        )
        .route(
            "/accounts/{account_id}/tunnels/{tunnel_id}/hostnames/{hostname}",
            put(update_hostname).delete(delete_hostname),
        )
}

#[derive(Debug, Deserialize, Validate)]
pub struct HostnameRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "hostname is required"))]
    pub hostname: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "service is required"))]
    pub service: String,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, rename = "originRequest")]
    pub origin_request: Option<serde_json::Value>,
}

impl HostnameRequest {
    /// Trimmed copy, so whitespace-only fields fail validation
    fn trimmed(self) -> Self {
        Self {
            hostname: self.hostname.trim().to_string(),
            service: self.service.trim().to_string(),
            ..self
        }
    }

    fn into_rule(self) -> IngressRule {
        IngressRule {
            hostname: Some(self.hostname),
            service: self.service,
            path: self
                .path
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            origin_request: self.origin_request.filter(|v| !v.is_null()),
        }
    }
}

/// "<done>" or "<done>, but DNS <reason>" when the advisory step failed
fn saga_message(done: &str, change: &HostnameChange) -> String {
    match change.dns.failure_reason() {
        Some(reason) => format!("{}, but DNS update failed: {}", done, reason),
        None => done.to_string(),
    }
}

async fn list_hostnames(
    State(state): State<AppState>,
    Path((account_id, tunnel_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<IngressRule>>>> {
    let sync = HostnameSync::new(state.cloudflare()?, &state.tunnel_locks);
    let rules = sync.list(&account_id, &tunnel_id).await?;
    let message = format!("Found {} hostname(s)", rules.len());
    Ok(Json(ApiResponse::ok(message, rules)))
}

async fn create_hostname(
    State(state): State<AppState>,
    Path((account_id, tunnel_id)): Path<(String, String)>,
    Json(request): Json<HostnameRequest>,
) -> Result<Json<ApiResponse<HostnameChange>>> {
    let request = request.trimmed();
    request.validate()?;

    let sync = HostnameSync::new(state.cloudflare()?, &state.tunnel_locks);
    let change = sync
        .create(&account_id, &tunnel_id, request.into_rule())
        .await?;

    let message = saga_message("Hostname added", &change);
    Ok(Json(ApiResponse::ok(message, change)))
}

async fn update_hostname(
    State(state): State<AppState>,
    Path((account_id, tunnel_id, hostname)): Path<(String, String, String)>,
    Json(request): Json<HostnameRequest>,
) -> Result<Json<ApiResponse<HostnameChange>>> {
    let request = request.trimmed();
    request.validate()?;

    let sync = HostnameSync::new(state.cloudflare()?, &state.tunnel_locks);
    let change = sync
        .update(&account_id, &tunnel_id, &hostname, request.into_rule())
        .await?;

    let message = saga_message("Hostname updated", &change);
    Ok(Json(ApiResponse::ok(message, change)))
}

async fn delete_hostname(
    State(state): State<AppState>,
    Path((account_id, tunnel_id, hostname)): Path<(String, String, String)>,
) -> Result<Json<ApiResponse<HostnameChange>>> {
    let sync = HostnameSync::new(state.cloudflare()?, &state.tunnel_locks);
    let change = sync.delete(&account_id, &tunnel_id, &hostname).await?;

    let message = saga_message("Hostname removed", &change);
    Ok(Json(ApiResponse::ok(message, change)))
}

//! Docker container, image, volume and network endpoints
//!
//! Includes lifecycle handlers for cloudflared tunnel containers. Every
//! handler answers 503 when no Docker daemon was reachable at startup.

use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post},
    Json, Router,
};
use bollard::models::{ContainerInspectResponse, ContainerSummary, ImageSummary, Network, Volume};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::response::ApiResponse;
use crate::error::{AppError, Result};
use crate::services::docker::{
    CreateContainerParams, CreateTunnelContainerParams, CreatedContainer, DockerDiagnostics,
};
use crate::state::AppState;

/// Create the Docker routes, mounted at `/api/docker`
pub fn docker_routes(state: AppState) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/diagnostics", get(diagnostics))
        .route("/containers", get(list_containers).post(create_container))
        .route(
            "/containers/{id}",
            get(inspect_container).delete(remove_container),
        )
        .route("/containers/{id}/start", post(start_container))
        .route("/containers/{id}/stop", post(stop_container))
        .route("/containers/{id}/restart", post(restart_container))
        .route("/images", get(list_images))
        .route("/images/pull", post(pull_image))
        .route("/volumes", get(list_volumes))
        .route("/networks", get(list_networks))
        .route(
            "/cloudflare/tunnels",
            get(list_tunnel_containers).post(create_tunnel_container),
        )
        .route("/cloudflare/tunnels/{id}", delete(remove_tunnel_container))
        .route("/cloudflare/tunnels/{id}/start", post(start_tunnel_container))
        .route("/cloudflare/tunnels/{id}/stop", post(stop_tunnel_container))
        .route(
            "/cloudflare/tunnels/{id}/restart",
            post(restart_tunnel_container),
        )
        .with_state(state)
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ContainerListQuery {
    #[serde(default = "default_all")]
    pub all: bool,
}

fn default_all() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
pub struct PullImageRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,
}

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub reply: String,
}

/// Flattened view of a tunnel container for the dashboard table
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TunnelContainer {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    pub created: Option<i64>,
}

impl From<ContainerSummary> for TunnelContainer {
    fn from(c: ContainerSummary) -> Self {
        let name = c
            .names
            .and_then(|n| n.first().cloned())
            .unwrap_or_else(|| "unnamed".to_string());
        Self {
            id: c.id.unwrap_or_default(),
            name: name.trim_start_matches('/').to_string(),
            image: c.image.unwrap_or_else(|| "unknown".to_string()),
            status: c.status.unwrap_or_else(|| "unknown".to_string()),
            created: c.created,
        }
    }
}

/// Tunnel container ids come from the dashboard table, which shows
/// "Unknown" for containers it could not identify.
pub fn validate_tunnel_container_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() || id.eq_ignore_ascii_case("unknown") {
        return Err(AppError::BadRequest(
            "A valid container id is required".to_string(),
        ));
    }
    Ok(id)
}

fn missing_container(id: &str) -> AppError {
    AppError::NotFound(format!("Container {} not found", id))
}

// ============================================================================
// Daemon Handlers
// ============================================================================

async fn ping(State(state): State<AppState>) -> Result<Json<ApiResponse<PingResponse>>> {
    let reply = state.docker()?.ping().await?;
    Ok(Json(ApiResponse::ok("Docker is reachable", PingResponse { reply })))
}

async fn diagnostics(State(state): State<AppState>) -> Result<Json<ApiResponse<DockerDiagnostics>>> {
    let report = state.docker()?.diagnostics().await;
    let message = if report.errors.is_empty() {
        "Docker diagnostics".to_string()
    } else {
        format!("Docker diagnostics with {} error(s)", report.errors.len())
    };
    Ok(Json(ApiResponse::ok(message, report)))
}

// ============================================================================
// Container Handlers
// ============================================================================

async fn list_containers(
    State(state): State<AppState>,
    Query(query): Query<ContainerListQuery>,
) -> Result<Json<ApiResponse<Vec<ContainerSummary>>>> {
    let containers = state.docker()?.list_containers(query.all).await?;
    let message = format!("Found {} container(s)", containers.len());
    Ok(Json(ApiResponse::ok(message, containers)))
}

async fn inspect_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ContainerInspectResponse>>> {
    let details = state
        .docker()?
        .inspect_container(&id)
        .await
        .map_err(|e| if e.is_not_found() { missing_container(&id) } else { e })?;
    Ok(Json(ApiResponse::ok("Container", details)))
}

async fn create_container(
    State(state): State<AppState>,
    Json(params): Json<CreateContainerParams>,
) -> Result<Json<ApiResponse<CreatedContainer>>> {
    params.validate()?;
    let created = state.docker()?.create_container(&params).await?;
    Ok(Json(ApiResponse::ok("Container created", created)))
}

async fn start_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state.docker()?.start_container(&id).await?;
    Ok(Json(ApiResponse::message("Container started")))
}

async fn stop_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state.docker()?.stop_container(&id).await?;
    Ok(Json(ApiResponse::message("Container stopped")))
}

async fn restart_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state.docker()?.restart_container(&id).await?;
    Ok(Json(ApiResponse::message("Container restarted")))
}

async fn remove_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state.docker()?.remove_container(&id).await?;
    tracing::info!("Removed container {}", id);
    Ok(Json(ApiResponse::message("Container removed")))
}

// ============================================================================
// Image, Volume and Network Handlers
// ============================================================================

async fn list_images(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<ImageSummary>>>> {
    let images = state.docker()?.list_images().await?;
    Ok(Json(ApiResponse::ok("Images", images)))
}

async fn pull_image(
    State(state): State<AppState>,
    Json(request): Json<PullImageRequest>,
) -> Result<Json<ApiResponse<()>>> {
    request.validate()?;
    let image = request.image.trim();
    state.docker()?.pull_image(image).await?;
    Ok(Json(ApiResponse::message(format!("Pulled {}", image))))
}

async fn list_volumes(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Volume>>>> {
    let volumes = state.docker()?.list_volumes().await?;
    Ok(Json(ApiResponse::ok("Volumes", volumes)))
}

async fn list_networks(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Network>>>> {
    let networks = state.docker()?.list_networks().await?;
    Ok(Json(ApiResponse::ok("Networks", networks)))
}

// ============================================================================
// Tunnel Container Handlers
// ============================================================================

async fn list_tunnel_containers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<TunnelContainer>>>> {
    let containers: Vec<TunnelContainer> = state
        .docker()?
        .find_tunnel_containers()
        .await?
        .into_iter()
        .map(TunnelContainer::from)
        .collect();
    let message = format!("Found {} tunnel container(s)", containers.len());
    Ok(Json(ApiResponse::ok(message, containers)))
}

async fn create_tunnel_container(
    State(state): State<AppState>,
    Json(params): Json<CreateTunnelContainerParams>,
) -> Result<Json<ApiResponse<CreatedContainer>>> {
    params.validate()?;
    let created = state.docker()?.create_tunnel_container(&params).await?;
    Ok(Json(ApiResponse::ok("Tunnel container started", created)))
}

async fn remove_tunnel_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let id = validate_tunnel_container_id(&id)?;
    match state.docker()?.remove_container(id).await {
        Ok(()) => {
            tracing::info!("Removed tunnel container {}", id);
            Ok(Json(ApiResponse::message("Tunnel container removed")))
        }
        Err(e) if e.is_not_found() => Ok(Json(ApiResponse::message(
            "Container doesn't exist or was already removed",
        ))),
        Err(e) => Err(e),
    }
}

async fn start_tunnel_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let id = validate_tunnel_container_id(&id)?;
    state
        .docker()?
        .start_container(id)
        .await
        .map_err(|e| if e.is_not_found() { missing_container(id) } else { e })?;
    Ok(Json(ApiResponse::message("Tunnel container started")))
}

async fn stop_tunnel_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let id = validate_tunnel_container_id(&id)?;
    state
        .docker()?
        .stop_container(id)
        .await
        .map_err(|e| if e.is_not_found() { missing_container(id) } else { e })?;
    Ok(Json(ApiResponse::message("Tunnel container stopped")))
}

async fn restart_tunnel_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let id = validate_tunnel_container_id(&id)?;
    state
        .docker()?
        .restart_container(id)
        .await
        .map_err(|e| if e.is_not_found() { missing_container(id) } else { e })?;
    Ok(Json(ApiResponse::message("Tunnel container restarted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tunnel_container_id_validation() {
        assert!(validate_tunnel_container_id("").is_err());
        assert!(validate_tunnel_container_id("  ").is_err());
        assert!(validate_tunnel_container_id("Unknown").is_err());
        assert!(validate_tunnel_container_id("unknown").is_err());
        assert_eq!(validate_tunnel_container_id(" abc123 ").unwrap(), "abc123");
    }

    #[test]
    fn test_tunnel_container_view() {
        let summary = ContainerSummary {
            id: Some("abc".to_string()),
            names: Some(vec!["/cloudflared-home".to_string()]),
            image: Some("cloudflare/cloudflared:latest".to_string()),
            status: Some("Up 2 hours".to_string()),
            created: Some(1_700_000_000),
            ..Default::default()
        };
        let view = TunnelContainer::from(summary);
        assert_eq!(view.name, "cloudflared-home");
        assert_eq!(view.status, "Up 2 hours");
        assert_eq!(view.created, Some(1_700_000_000));
    }

    #[test]
    fn test_tunnel_container_view_defaults() {
        let view = TunnelContainer::from(ContainerSummary::default());
        assert_eq!(view.name, "unnamed");
        assert_eq!(view.image, "unknown");
        assert_eq!(view.id, "");
    }
}

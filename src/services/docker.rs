//! Docker Engine adapter
//!
//! Thin wrapper over `bollard` for the dashboard: container CRUD, images,
//! volumes, networks and the cloudflared tunnel-container helpers. Every call
//! runs under a fixed timeout; nothing is retried.

#![allow(deprecated)]

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use bollard::container::{Config, CreateContainerOptions, ListContainersOptions};
use bollard::image::CreateImageOptions;
use bollard::models::{
    ContainerInspectResponse, ContainerSummary, CreateImageInfo, HostConfig, ImageSummary,
    Network, PortBinding, RestartPolicy, RestartPolicyNameEnum, SystemVersion, Volume,
};
use bollard::Docker;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, Result};

// ============================================================================
// Constants
// ============================================================================

const LIST_TIMEOUT: Duration = Duration::from_secs(10);
const PING_TIMEOUT: Duration = Duration::from_secs(5);
const MUTATE_TIMEOUT: Duration = Duration::from_secs(30);
const PULL_TIMEOUT: Duration = Duration::from_secs(300);
/// Grace period handed to the daemon before it kills a stopping container
const STOP_GRACE_SECS: i32 = 30;

pub const TUNNEL_LABEL: &str = "com.cloudflare.tunnel";
pub const TUNNEL_IMAGE: &str = "cloudflare/cloudflared:latest";
pub const TUNNEL_NAME_PREFIX: &str = "cloudflared-";
pub const DEFAULT_TUNNEL_NAME: &str = "cloudflared-tunnel";
const TUNNEL_NAME_HINTS: [&str; 3] = ["cloudflare", "cloudflared", "tunnel"];

// ============================================================================
// Request types
// ============================================================================

/// Generic container creation request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateContainerParams {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, message = "image is required"))]
    pub image: String,
    /// host port -> container port (`"8080": "80"` or `"5353": "53/udp"`)
    #[serde(default)]
    pub ports: HashMap<String, String>,
    /// host path -> container path
    #[serde(default)]
    pub volumes: HashMap<String, String>,
    /// `KEY=value` entries
    #[serde(default)]
    pub env: Vec<String>,
    #[serde(default)]
    pub command: Vec<String>,
    #[serde(default)]
    pub network_mode: Option<String>,
    #[serde(default)]
    pub restart_policy: Option<String>,
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

/// Request to run cloudflared for an existing tunnel token
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateTunnelContainerParams {
    #[serde(default)]
    #[validate(length(min = 1, message = "token is required"))]
    pub token: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub network_mode: Option<String>,
    #[serde(default)]
    pub restart_policy: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedContainer {
    pub id: String,
    pub name: String,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DockerDiagnostics {
    pub docker_host: Option<String>,
    pub ping: String,
    pub version: Option<SystemVersion>,
    pub containers: Option<usize>,
    pub errors: Vec<String>,
}

// ============================================================================
// Pure helpers
// ============================================================================

/// Heuristic used when no container carries the tunnel label
pub fn looks_like_tunnel(container: &ContainerSummary) -> bool {
    let matches = |value: &str| {
        let value = value.to_lowercase();
        TUNNEL_NAME_HINTS.iter().any(|hint| value.contains(hint))
    };

    container.image.as_deref().is_some_and(matches)
        || container
            .names
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| matches(n)))
}

/// `None`/empty -> default name, otherwise ensure the `cloudflared-` prefix
pub fn tunnel_container_name(requested: Option<&str>) -> String {
    match requested.map(str::trim).filter(|n| !n.is_empty()) {
        None => DEFAULT_TUNNEL_NAME.to_string(),
        Some(name) if name.starts_with(TUNNEL_NAME_PREFIX) => name.to_string(),
        Some(name) => format!("{}{}", TUNNEL_NAME_PREFIX, name),
    }
}

pub fn parse_restart_policy(policy: &str) -> Result<RestartPolicy> {
    let name = match policy.trim().to_lowercase().as_str() {
        "" | "no" => RestartPolicyNameEnum::NO,
        "always" => RestartPolicyNameEnum::ALWAYS,
        "unless-stopped" => RestartPolicyNameEnum::UNLESS_STOPPED,
        "on-failure" => RestartPolicyNameEnum::ON_FAILURE,
        other => {
            return Err(AppError::BadRequest(format!(
                "Unsupported restart policy: {}",
                other
            )))
        }
    };
    Ok(RestartPolicy {
        name: Some(name),
        maximum_retry_count: None,
    })
}

/// `(image, tag)` with `latest` when no tag is given
pub fn parse_image_tag(image: &str) -> (&str, &str) {
    // A colon before the last slash belongs to a registry port, not a tag.
    match image.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') => (name, tag),
        _ => (image, "latest"),
    }
}

/// Translate a creation request into the daemon's container config
pub fn container_config(params: &CreateContainerParams) -> Result<Config<String>> {
    let mut port_bindings = HashMap::new();
    let mut exposed_ports = HashMap::new();

    for (host_port, container_port) in &params.ports {
        let container_port = if container_port.contains('/') {
            container_port.clone()
        } else {
            format!("{}/tcp", container_port)
        };
        exposed_ports.insert(container_port.clone(), HashMap::new());
        port_bindings.insert(
            container_port,
            Some(vec![PortBinding {
                host_ip: Some("0.0.0.0".to_string()),
                host_port: Some(host_port.clone()),
            }]),
        );
    }

    let binds: Vec<String> = params
        .volumes
        .iter()
        .map(|(host, container)| format!("{}:{}", host, container))
        .collect();

    let restart_policy = params
        .restart_policy
        .as_deref()
        .map(parse_restart_policy)
        .transpose()?;

    let host_config = HostConfig {
        port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
        binds: (!binds.is_empty()).then_some(binds),
        network_mode: params.network_mode.clone().filter(|m| !m.is_empty()),
        restart_policy,
        ..Default::default()
    };

    Ok(Config {
        image: Some(params.image.clone()),
        env: (!params.env.is_empty()).then(|| params.env.clone()),
        cmd: (!params.command.is_empty()).then(|| params.command.clone()),
        exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
        labels: (!params.labels.is_empty()).then(|| params.labels.clone()),
        host_config: Some(host_config),
        ..Default::default()
    })
}

/// Creation request for a cloudflared container running `token`
pub fn tunnel_container_params(params: &CreateTunnelContainerParams) -> CreateContainerParams {
    let labels = HashMap::from([
        (TUNNEL_LABEL.to_string(), "true".to_string()),
        ("app".to_string(), "cloudflared".to_string()),
        ("service".to_string(), "tunnel".to_string()),
        ("managed-by".to_string(), env!("CARGO_PKG_NAME").to_string()),
    ]);

    CreateContainerParams {
        name: Some(tunnel_container_name(params.name.as_deref())),
        image: TUNNEL_IMAGE.to_string(),
        command: vec![
            "tunnel".to_string(),
            "--no-autoupdate".to_string(),
            "run".to_string(),
            "--token".to_string(),
            params.token.clone(),
        ],
        network_mode: params.network_mode.clone(),
        restart_policy: Some(
            params
                .restart_policy
                .clone()
                .filter(|p| !p.is_empty())
                .unwrap_or_else(|| "always".to_string()),
        ),
        labels,
        ..Default::default()
    }
}

/// The daemon answers 304 when a container is already in the requested state
fn is_not_modified(err: &bollard::errors::Error) -> bool {
    matches!(
        err,
        bollard::errors::Error::DockerResponseServerError {
            status_code: 304,
            ..
        }
    )
}

async fn with_timeout<T, F>(limit: Duration, what: &str, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, bollard::errors::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::Timeout(what.to_string())),
    }
}

// ============================================================================
// Service
// ============================================================================

#[derive(Clone)]
pub struct DockerService {
    docker: Docker,
}

impl DockerService {
    /// Connect via `DOCKER_HOST` or the platform's default socket
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    pub async fn ping(&self) -> Result<String> {
        with_timeout(PING_TIMEOUT, "docker ping", self.docker.ping()).await
    }

    pub async fn version(&self) -> Result<SystemVersion> {
        with_timeout(PING_TIMEOUT, "docker version", self.docker.version()).await
    }

    pub async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>> {
        let options = ListContainersOptions::<String> {
            all,
            ..Default::default()
        };
        with_timeout(
            LIST_TIMEOUT,
            "list containers",
            self.docker.list_containers(Some(options)),
        )
        .await
    }

    pub async fn inspect_container(&self, id: &str) -> Result<ContainerInspectResponse> {
        with_timeout(
            LIST_TIMEOUT,
            "inspect container",
            self.docker
                .inspect_container(id, None::<bollard::query_parameters::InspectContainerOptions>),
        )
        .await
    }

    pub async fn create_container(&self, params: &CreateContainerParams) -> Result<CreatedContainer> {
        params.validate()?;
        let config = container_config(params)?;
        let name = params.name.clone().unwrap_or_default();
        let options = (!name.is_empty()).then(|| CreateContainerOptions {
            name: name.clone(),
            platform: None,
        });

        let response = with_timeout(
            MUTATE_TIMEOUT,
            "create container",
            self.docker.create_container(options, config),
        )
        .await?;

        tracing::info!("Created container {} ({})", name, response.id);
        Ok(CreatedContainer {
            id: response.id,
            name,
            warnings: response.warnings,
        })
    }

    pub async fn start_container(&self, id: &str) -> Result<()> {
        let started = tokio::time::timeout(
            MUTATE_TIMEOUT,
            self.docker
                .start_container(id, None::<bollard::query_parameters::StartContainerOptions>),
        )
        .await
        .map_err(|_| AppError::Timeout("start container".to_string()))?;

        match started {
            Ok(()) => Ok(()),
            Err(e) if is_not_modified(&e) => {
                tracing::debug!("Container {} already running", id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn stop_container(&self, id: &str) -> Result<()> {
        let options = bollard::query_parameters::StopContainerOptions {
            t: Some(STOP_GRACE_SECS),
            ..Default::default()
        };
        // The daemon may take the full grace period before answering.
        let limit = MUTATE_TIMEOUT + Duration::from_secs(STOP_GRACE_SECS as u64);
        let stopped = tokio::time::timeout(limit, self.docker.stop_container(id, Some(options)))
            .await
            .map_err(|_| AppError::Timeout("stop container".to_string()))?;

        match stopped {
            Ok(()) => Ok(()),
            Err(e) if is_not_modified(&e) => {
                tracing::debug!("Container {} already stopped", id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn restart_container(&self, id: &str) -> Result<()> {
        let limit = MUTATE_TIMEOUT + Duration::from_secs(STOP_GRACE_SECS as u64);
        with_timeout(
            limit,
            "restart container",
            self.docker
                .restart_container(id, None::<bollard::query_parameters::RestartContainerOptions>),
        )
        .await
    }

    pub async fn remove_container(&self, id: &str) -> Result<()> {
        let options = bollard::query_parameters::RemoveContainerOptions {
            force: true,
            ..Default::default()
        };
        with_timeout(
            MUTATE_TIMEOUT,
            "remove container",
            self.docker.remove_container(id, Some(options)),
        )
        .await
    }

    pub async fn list_images(&self) -> Result<Vec<ImageSummary>> {
        with_timeout(
            LIST_TIMEOUT,
            "list images",
            self.docker
                .list_images(None::<bollard::query_parameters::ListImagesOptions>),
        )
        .await
    }

    pub async fn list_volumes(&self) -> Result<Vec<Volume>> {
        let response = with_timeout(
            LIST_TIMEOUT,
            "list volumes",
            self.docker
                .list_volumes(None::<bollard::query_parameters::ListVolumesOptions>),
        )
        .await?;
        Ok(response.volumes.unwrap_or_default())
    }

    pub async fn list_networks(&self) -> Result<Vec<Network>> {
        with_timeout(
            LIST_TIMEOUT,
            "list networks",
            self.docker
                .list_networks(None::<bollard::query_parameters::ListNetworksOptions>),
        )
        .await
    }

    /// Pull `image`, draining the progress stream
    pub async fn pull_image(&self, image: &str) -> Result<()> {
        let (image_name, tag) = parse_image_tag(image);
        tracing::info!("Pulling image {}:{}", image_name, tag);

        let options = CreateImageOptions {
            from_image: image_name,
            tag,
            ..Default::default()
        };

        let pull = async {
            let mut stream =
                self.docker
                    .create_image(Some(options), None, None::<bollard::auth::DockerCredentials>);
            while let Some(info) = stream.next().await {
                match info {
                    Ok(CreateImageInfo {
                        status: Some(status),
                        ..
                    }) => tracing::debug!("{}: {}", image, status),
                    Ok(_) => {}
                    Err(e) => return Err(AppError::from(e)),
                }
            }
            Ok(())
        };

        tokio::time::timeout(PULL_TIMEOUT, pull)
            .await
            .map_err(|_| AppError::Timeout(format!("pull image {}", image)))?
    }

    // ------------------------------------------------------------------------
    // Tunnel containers
    // ------------------------------------------------------------------------

    /// Containers running cloudflared: by label, else by name/image heuristic
    pub async fn find_tunnel_containers(&self) -> Result<Vec<ContainerSummary>> {
        let options = ListContainersOptions::<String> {
            all: true,
            filters: HashMap::from([(
                "label".to_string(),
                vec![format!("{}=true", TUNNEL_LABEL)],
            )]),
            ..Default::default()
        };

        match with_timeout(
            LIST_TIMEOUT,
            "list tunnel containers",
            self.docker.list_containers(Some(options)),
        )
        .await
        {
            Ok(labelled) if !labelled.is_empty() => return Ok(labelled),
            Ok(_) => {}
            Err(e) => tracing::warn!("Label lookup for tunnel containers failed: {}", e),
        }

        let all = self.list_containers(true).await?;
        Ok(all.into_iter().filter(looks_like_tunnel).collect())
    }

    /// Pull cloudflared, create the container and start it
    pub async fn create_tunnel_container(
        &self,
        params: &CreateTunnelContainerParams,
    ) -> Result<CreatedContainer> {
        params.validate()?;
        let container = tunnel_container_params(params);

        self.pull_image(TUNNEL_IMAGE).await?;
        let created = self.create_container(&container).await?;
        self.start_container(&created.id).await?;

        tracing::info!("Started tunnel container {}", created.name);
        Ok(created)
    }

    /// Ping, version and container count, collecting failures instead of aborting
    pub async fn diagnostics(&self) -> DockerDiagnostics {
        let mut errors = Vec::new();

        let ping = match self.ping().await {
            Ok(reply) => reply,
            Err(e) => {
                errors.push(format!("ping: {}", e));
                "failed".to_string()
            }
        };
        let version = match self.version().await {
            Ok(v) => Some(v),
            Err(e) => {
                errors.push(format!("version: {}", e));
                None
            }
        };
        let containers = match self.list_containers(true).await {
            Ok(list) => Some(list.len()),
            Err(e) => {
                errors.push(format!("list containers: {}", e));
                None
            }
        };

        DockerDiagnostics {
            docker_host: std::env::var("DOCKER_HOST").ok(),
            ping,
            version,
            containers,
            errors,
        }
    }
}

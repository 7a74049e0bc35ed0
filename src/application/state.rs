use std::path::PathBuf;
use std::sync::Arc;

use crate::config::auth::AuthConfig;
use crate::error::{AppError, Result};
use crate::services::cloudflare::CloudflareApi;
use crate::services::docker::DockerService;
use crate::services::hostnames::TunnelLocks;
use crate::services::session::{InMemorySessionStore, SessionStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<dyn SessionStore>,
    /// `None` when no Cloudflare credentials are configured
    pub cloudflare: Option<Arc<dyn CloudflareApi>>,
    /// `None` when the Docker daemon was unreachable at startup
    pub docker: Option<DockerService>,
    pub tunnel_locks: TunnelLocks,
    pub auth: AuthConfig,
    pub web_dir: PathBuf,
}

impl AppState {
    pub fn new(
        cloudflare: Option<Arc<dyn CloudflareApi>>,
        docker: Option<DockerService>,
        auth: AuthConfig,
        web_dir: PathBuf,
    ) -> Self {
        Self {
            sessions: Arc::new(InMemorySessionStore::new()),
            cloudflare,
            docker,
            tunnel_locks: TunnelLocks::new(),
            auth,
            web_dir,
        }
    }

    /// Swap the session backend
    pub fn with_session_store(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.sessions = sessions;
        self
    }

    pub fn cloudflare(&self) -> Result<&dyn CloudflareApi> {
        self.cloudflare.as_deref().ok_or_else(|| {
            AppError::ServiceUnavailable(
                "Cloudflare credentials are not configured. Set CLOUDFLARE_API_TOKEN, or CLOUDFLARE_API_KEY and CLOUDFLARE_EMAIL".to_string(),
            )
        })
    }

    pub fn docker(&self) -> Result<&DockerService> {
        self.docker
            .as_ref()
            .ok_or_else(|| AppError::ServiceUnavailable("Docker client not available".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> AppState {
        AppState::new(None, None, AuthConfig::default(), PathBuf::from("web"))
    }

    #[test]
    fn test_missing_clients_are_unavailable() {
        let state = state();
        assert!(matches!(
            state.cloudflare(),
            Err(AppError::ServiceUnavailable(_))
        ));
        assert!(matches!(state.docker(), Err(AppError::ServiceUnavailable(_))));
    }

    #[test]
    fn test_clones_share_session_store() {
        let state = state();
        let clone = state.clone();
        state
            .sessions
            .set(crate::services::session::Session::new("admin"));
        assert_eq!(clone.sessions.len(), 1);
    }
}

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cfproxyhub::config::CONFIG;
use cfproxyhub::endpoints::create_router;
use cfproxyhub::services::{CloudflareApi, CloudflareClient, DockerService};
use cfproxyhub::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting cfproxyhub v{}", CONFIG.version);

    // Cloudflare client
    let cloudflare: Option<Arc<dyn CloudflareApi>> = match CONFIG.cloudflare.credentials() {
        Some(credentials) => {
            match CloudflareClient::new(CONFIG.cloudflare.api_base.clone(), credentials) {
                Ok(client) => {
                    tracing::info!("Cloudflare client initialized");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::warn!("Failed to initialize Cloudflare client: {}", e);
                    None
                }
            }
        }
        None => {
            tracing::warn!(
                "Cloudflare credentials missing. Cloudflare features will be unavailable."
            );
            None
        }
    };

    // Docker client
    let docker = match DockerService::connect() {
        Ok(docker) => match docker.ping().await {
            Ok(_) => {
                tracing::info!("Docker daemon reachable");
                Some(docker)
            }
            Err(e) => {
                tracing::warn!(
                    "Docker daemon not responding: {}. Docker features will be unavailable.",
                    e
                );
                None
            }
        },
        Err(e) => {
            tracing::warn!(
                "Failed to initialize Docker client: {}. Docker features will be unavailable.",
                e
            );
            None
        }
    };

    let state = AppState::new(
        cloudflare,
        docker,
        CONFIG.auth.clone(),
        CONFIG.server.web_dir.clone(),
    );

    let app = create_app(state);

    let addr = format!("{}:{}", CONFIG.server.host, CONFIG.server.port);
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cfproxyhub=debug,tower_http=debug".into());

    if CONFIG.log_format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

/// Any origin when none are configured; otherwise the listed ones, with cookies
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}

fn create_app(state: AppState) -> Router {
    create_router(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&CONFIG.server.allowed_origins))
}

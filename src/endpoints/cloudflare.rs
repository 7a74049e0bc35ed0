//! Cloudflare account, zone, DNS record and tunnel endpoints

use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::response::ApiResponse;
use crate::endpoints::hostnames;
use crate::error::Result;
use crate::services::cloudflare::{
    Account, DnsRecord, DnsRecordInput, NewZone, Tunnel, TunnelConfiguration, Zone, ZoneFilter,
    ZoneUpdate,
};
use crate::services::domain::find_zone_by_name;
use crate::state::AppState;

const DROPDOWN_DEFAULT_LIMIT: usize = 50;
const DROPDOWN_MAX_LIMIT: usize = 100;

/// Create the Cloudflare routes, mounted at `/api/cloudflare`
pub fn cloudflare_routes(state: AppState) -> Router {
    Router::new()
        .route("/accounts", get(list_accounts))
        .route("/accounts/{account_id}", get(get_account))
        .route(
            "/accounts/{account_id}/zones",
            get(list_zones).post(create_zone),
        )
        .route("/accounts/{account_id}/zones/dropdown", get(zones_dropdown))
        .route(
            "/accounts/{account_id}/zones/by-name/{domain}",
            get(get_zone_by_name),
        )
        .route(
            "/zones/{zone_id}",
            get(get_zone).patch(update_zone).delete(delete_zone),
        )
        .route(
            "/zones/{zone_id}/dns_records",
            get(list_dns_records).post(create_dns_record),
        )
        .route(
            "/zones/{zone_id}/dns_records/{record_id}",
            put(update_dns_record).delete(delete_dns_record),
        )
        .route(
            "/accounts/{account_id}/tunnels",
            get(list_tunnels).post(create_tunnel),
        )
        .route(
            "/accounts/{account_id}/tunnels/{tunnel_id}",
            get(get_tunnel).put(rename_tunnel).delete(delete_tunnel),
        )
        .route(
            "/accounts/{account_id}/tunnels/{tunnel_id}/token",
            get(get_tunnel_token),
        )
        .route(
            "/accounts/{account_id}/tunnels/{tunnel_id}/configuration",
            get(get_tunnel_configuration),
        )
        .merge(hostnames::hostname_routes())
        .with_state(state)
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ZoneListQuery {
    #[serde(default)]
    pub active_only: bool,
    pub search: Option<String>,
    #[serde(default)]
    pub summary: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DropdownQuery {
    pub search: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DnsRecordQuery {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ZoneSummary {
    pub id: String,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ZoneOption {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ZoneList {
    Full(Vec<Zone>),
    Summary(Vec<ZoneSummary>),
}

#[derive(Debug, Deserialize, Validate)]
pub struct TunnelNameRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TunnelToken {
    pub tunnel_id: String,
    pub token: String,
}

// ============================================================================
// Zone list shaping
// ============================================================================

fn matches_search(zone: &Zone, search: Option<&str>) -> bool {
    match search.map(str::trim).filter(|s| !s.is_empty()) {
        Some(term) => zone.name.to_lowercase().contains(&term.to_lowercase()),
        None => true,
    }
}

/// Apply the list query's client-side search and shape
pub fn shape_zone_list(zones: Vec<Zone>, query: &ZoneListQuery) -> ZoneList {
    let zones: Vec<Zone> = zones
        .into_iter()
        .filter(|z| matches_search(z, query.search.as_deref()))
        .filter(|z| !query.active_only || z.is_active())
        .collect();

    if query.summary {
        ZoneList::Summary(
            zones
                .into_iter()
                .map(|z| ZoneSummary {
                    id: z.id,
                    name: z.name,
                    status: z.status,
                })
                .collect(),
        )
    } else {
        ZoneList::Full(zones)
    }
}

/// Active zones matching `search`, sorted by name and capped at the limit
pub fn zone_options(zones: Vec<Zone>, query: &DropdownQuery) -> Vec<ZoneOption> {
    let limit = query
        .limit
        .unwrap_or(DROPDOWN_DEFAULT_LIMIT)
        .clamp(1, DROPDOWN_MAX_LIMIT);

    let mut options: Vec<ZoneOption> = zones
        .into_iter()
        .filter(|z| z.is_active() && matches_search(z, query.search.as_deref()))
        .map(|z| ZoneOption {
            id: z.id,
            name: z.name,
        })
        .collect();
    options.sort_by(|a, b| a.name.cmp(&b.name));
    options.truncate(limit);
    options
}

// ============================================================================
// Account Handlers
// ============================================================================

async fn list_accounts(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Account>>>> {
    let accounts = state.cloudflare()?.list_accounts().await?;
    let message = format!("Found {} account(s)", accounts.len());
    Ok(Json(ApiResponse::ok(message, accounts)))
}

async fn get_account(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<ApiResponse<Account>>> {
    let account = state.cloudflare()?.get_account(&account_id).await?;
    Ok(Json(ApiResponse::ok("Account", account)))
}

// ============================================================================
// Zone Handlers
// ============================================================================

async fn list_zones(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<ZoneListQuery>,
) -> Result<Json<ApiResponse<ZoneList>>> {
    let filter = ZoneFilter {
        status: query.active_only.then(|| "active".to_string()),
        ..Default::default()
    };
    let zones = state.cloudflare()?.list_zones(&account_id, &filter).await?;
    let shaped = shape_zone_list(zones, &query);
    Ok(Json(ApiResponse::ok("Zones", shaped)))
}

async fn zones_dropdown(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Query(query): Query<DropdownQuery>,
) -> Result<Json<ApiResponse<Vec<ZoneOption>>>> {
    let filter = ZoneFilter {
        status: Some("active".to_string()),
        ..Default::default()
    };
    let zones = state.cloudflare()?.list_zones(&account_id, &filter).await?;
    Ok(Json(ApiResponse::ok("Zones", zone_options(zones, &query))))
}

async fn get_zone_by_name(
    State(state): State<AppState>,
    Path((account_id, domain)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Zone>>> {
    let zone = find_zone_by_name(state.cloudflare()?, &account_id, domain.trim()).await?;
    Ok(Json(ApiResponse::ok("Zone", zone)))
}

async fn create_zone(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(request): Json<NewZone>,
) -> Result<Json<ApiResponse<Zone>>> {
    request.validate()?;
    let zone = state.cloudflare()?.create_zone(&account_id, &request).await?;
    tracing::info!("Created zone {} ({})", zone.name, zone.id);
    Ok(Json(ApiResponse::ok("Zone created", zone)))
}

async fn get_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
) -> Result<Json<ApiResponse<Zone>>> {
    let zone = state.cloudflare()?.get_zone(&zone_id).await?;
    Ok(Json(ApiResponse::ok("Zone", zone)))
}

async fn update_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
    Json(request): Json<ZoneUpdate>,
) -> Result<Json<ApiResponse<Zone>>> {
    let zone = state.cloudflare()?.update_zone(&zone_id, &request).await?;
    Ok(Json(ApiResponse::ok("Zone updated", zone)))
}

async fn delete_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    state.cloudflare()?.delete_zone(&zone_id).await?;
    tracing::info!("Deleted zone {}", zone_id);
    Ok(Json(ApiResponse::message("Zone deleted")))
}

// ============================================================================
// DNS Record Handlers
// ============================================================================

async fn list_dns_records(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
    Query(query): Query<DnsRecordQuery>,
) -> Result<Json<ApiResponse<Vec<DnsRecord>>>> {
    let name = query.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let records = state.cloudflare()?.list_dns_records(&zone_id, name).await?;
    Ok(Json(ApiResponse::ok("DNS records", records)))
}

async fn create_dns_record(
    State(state): State<AppState>,
    Path(zone_id): Path<String>,
    Json(request): Json<DnsRecordInput>,
) -> Result<Json<ApiResponse<DnsRecord>>> {
    request.validate()?;
    let record = state
        .cloudflare()?
        .create_dns_record(&zone_id, &request)
        .await?;
    Ok(Json(ApiResponse::ok("DNS record created", record)))
}

async fn update_dns_record(
    State(state): State<AppState>,
    Path((zone_id, record_id)): Path<(String, String)>,
    Json(request): Json<DnsRecordInput>,
) -> Result<Json<ApiResponse<DnsRecord>>> {
    request.validate()?;
    let record = state
        .cloudflare()?
        .update_dns_record(&zone_id, &record_id, &request)
        .await?;
    Ok(Json(ApiResponse::ok("DNS record updated", record)))
}

async fn delete_dns_record(
    State(state): State<AppState>,
    Path((zone_id, record_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .cloudflare()?
        .delete_dns_record(&zone_id, &record_id)
        .await?;
    Ok(Json(ApiResponse::message("DNS record deleted")))
}

// ============================================================================
// Tunnel Handlers
// ============================================================================

async fn list_tunnels(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<Tunnel>>>> {
    let tunnels = state.cloudflare()?.list_tunnels(&account_id).await?;
    let message = format!("Found {} tunnel(s)", tunnels.len());
    Ok(Json(ApiResponse::ok(message, tunnels)))
}

async fn create_tunnel(
    State(state): State<AppState>,
    Path(account_id): Path<String>,
    Json(request): Json<TunnelNameRequest>,
) -> Result<Json<ApiResponse<Tunnel>>> {
    request.validate()?;
    let tunnel = state
        .cloudflare()?
        .create_tunnel(&account_id, request.name.trim())
        .await?;
    tracing::info!("Created tunnel {} ({})", tunnel.name, tunnel.id);
    Ok(Json(ApiResponse::ok("Tunnel created", tunnel)))
}

async fn get_tunnel(
    State(state): State<AppState>,
    Path((account_id, tunnel_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Tunnel>>> {
    let tunnel = state
        .cloudflare()?
        .get_tunnel(&account_id, &tunnel_id)
        .await?;
    Ok(Json(ApiResponse::ok("Tunnel", tunnel)))
}

async fn rename_tunnel(
    State(state): State<AppState>,
    Path((account_id, tunnel_id)): Path<(String, String)>,
    Json(request): Json<TunnelNameRequest>,
) -> Result<Json<ApiResponse<Tunnel>>> {
    request.validate()?;
    let tunnel = state
        .cloudflare()?
        .rename_tunnel(&account_id, &tunnel_id, request.name.trim())
        .await?;
    Ok(Json(ApiResponse::ok("Tunnel updated", tunnel)))
}

async fn delete_tunnel(
    State(state): State<AppState>,
    Path((account_id, tunnel_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>> {
    state
        .cloudflare()?
        .delete_tunnel(&account_id, &tunnel_id)
        .await?;
    tracing::info!("Deleted tunnel {}", tunnel_id);
    Ok(Json(ApiResponse::message("Tunnel deleted")))
}

async fn get_tunnel_token(
    State(state): State<AppState>,
    Path((account_id, tunnel_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<TunnelToken>>> {
    let token = state
        .cloudflare()?
        .get_tunnel_token(&account_id, &tunnel_id)
        .await?;
    Ok(Json(ApiResponse::ok(
        "Tunnel token",
        TunnelToken { tunnel_id, token },
    )))
}

async fn get_tunnel_configuration(
    State(state): State<AppState>,
    Path((account_id, tunnel_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<TunnelConfiguration>>> {
    let config = state
        .cloudflare()?
        .get_tunnel_configuration(&account_id, &tunnel_id)
        .await?;
    Ok(Json(ApiResponse::ok("Tunnel configuration", config)))
}

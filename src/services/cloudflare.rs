//! Cloudflare v4 API adapter
//!
//! [`CloudflareApi`] is the seam handlers and the hostname saga depend on;
//! [`CloudflareClient`] implements it over `reqwest` with either a scoped API
//! token or a global API key + email.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::cloudflare::CloudflareCredentials;
use crate::error::{AppError, Result};
use crate::services::ingress::IngressRule;

// ============================================================================
// Constants
// ============================================================================

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: u32 = 50;
const DNS_PAGE_SIZE: u32 = 100;
/// Stop following pagination after this many pages
const MAX_PAGES: u32 = 100;

pub const TUNNEL_CNAME_SUFFIX: &str = "cfargotunnel.com";

// ============================================================================
// Resource types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub account_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneAccount {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub paused: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub zone_type: Option<String>,
    #[serde(default)]
    pub name_servers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name_servers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_registrar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub development_mode: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<ZoneAccount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activated_on: Option<String>,
}

impl Zone {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case("active")
    }
}

/// Server-side zone list filters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneFilter {
    pub name: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewZone {
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub jump_start: bool,
    /// `full` (default) or `partial`
    #[serde(rename = "type", default)]
    pub zone_type: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ZoneUpdate {
    #[serde(default)]
    pub paused: Option<bool>,
    #[serde(default)]
    pub vanity_name_servers: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tunnel {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tun_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_config: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conns_active_at: Option<String>,
    #[serde(default)]
    pub connections: Vec<serde_json::Value>,
}

/// Body of a tunnel's remotely managed configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelConfig {
    #[serde(default)]
    pub ingress: Vec<IngressRule>,
    #[serde(
        rename = "originRequest",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_request: Option<serde_json::Value>,
    #[serde(
        rename = "warp-routing",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub warp_routing: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tunnel_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// Absent for tunnels that were never configured
    #[serde(default)]
    pub config: Option<TunnelConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl TunnelConfiguration {
    pub fn ingress(&self) -> &[IngressRule] {
        self.config
            .as_ref()
            .map(|c| c.ingress.as_slice())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_on: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_on: Option<String>,
}

impl DnsRecord {
    /// A CNAME for `hostname` that routes into some tunnel
    pub fn is_tunnel_cname_for(&self, hostname: &str) -> bool {
        self.record_type.eq_ignore_ascii_case("CNAME")
            && self.name.eq_ignore_ascii_case(hostname)
            && self.content.contains(TUNNEL_CNAME_SUFFIX)
    }
}

/// Create/update payload for a DNS record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DnsRecordInput {
    #[serde(rename = "type")]
    #[serde(default)]
    #[validate(length(min = 1, message = "type is required"))]
    pub record_type: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
    /// 1 means automatic
    #[serde(default = "default_ttl")]
    pub ttl: u32,
    #[serde(default)]
    pub proxied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

fn default_ttl() -> u32 {
    1
}

impl DnsRecordInput {
    /// Proxied CNAME `hostname` -> `<tunnel_id>.cfargotunnel.com`
    pub fn tunnel_cname(hostname: &str, tunnel_id: &str) -> Self {
        Self {
            record_type: "CNAME".to_string(),
            name: hostname.to_string(),
            content: format!("{}.{}", tunnel_id, TUNNEL_CNAME_SUFFIX),
            ttl: 1,
            proxied: true,
            comment: None,
        }
    }
}

// ============================================================================
// Adapter seam
// ============================================================================

#[async_trait]
pub trait CloudflareApi: Send + Sync {
    async fn list_accounts(&self) -> Result<Vec<Account>>;
    async fn get_account(&self, account_id: &str) -> Result<Account>;

    async fn list_zones(&self, account_id: &str, filter: &ZoneFilter) -> Result<Vec<Zone>>;
    async fn get_zone(&self, zone_id: &str) -> Result<Zone>;
    async fn create_zone(&self, account_id: &str, zone: &NewZone) -> Result<Zone>;
    async fn update_zone(&self, zone_id: &str, update: &ZoneUpdate) -> Result<Zone>;
    async fn delete_zone(&self, zone_id: &str) -> Result<()>;

    async fn list_tunnels(&self, account_id: &str) -> Result<Vec<Tunnel>>;
    async fn get_tunnel(&self, account_id: &str, tunnel_id: &str) -> Result<Tunnel>;
    async fn create_tunnel(&self, account_id: &str, name: &str) -> Result<Tunnel>;
    async fn rename_tunnel(&self, account_id: &str, tunnel_id: &str, name: &str)
        -> Result<Tunnel>;
    async fn delete_tunnel(&self, account_id: &str, tunnel_id: &str) -> Result<()>;
    async fn get_tunnel_token(&self, account_id: &str, tunnel_id: &str) -> Result<String>;

    async fn get_tunnel_configuration(
        &self,
        account_id: &str,
        tunnel_id: &str,
    ) -> Result<TunnelConfiguration>;
    /// Replaces the whole configuration, ingress list included
    async fn put_tunnel_configuration(
        &self,
        account_id: &str,
        tunnel_id: &str,
        config: &TunnelConfig,
    ) -> Result<TunnelConfiguration>;

    async fn list_dns_records(&self, zone_id: &str, name: Option<&str>) -> Result<Vec<DnsRecord>>;
    async fn create_dns_record(&self, zone_id: &str, record: &DnsRecordInput) -> Result<DnsRecord>;
    async fn update_dns_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecordInput,
    ) -> Result<DnsRecord>;
    async fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> Result<()>;
}

// ============================================================================
// Cloudflare API response envelope
// ============================================================================

#[derive(Deserialize)]
struct CfResponse<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<CfApiError>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Deserialize)]
struct CfApiError {
    #[serde(default)]
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: u32,
}

impl<T> CfResponse<T> {
    fn error_text(&self) -> String {
        if self.errors.is_empty() {
            return "unknown error".to_string();
        }
        self.errors
            .iter()
            .map(|e| format!("{} (code {})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn into_error(self, context: &str, status: StatusCode) -> AppError {
        let msg = self.error_text();
        if status == StatusCode::NOT_FOUND {
            return AppError::NotFound(format!("{}: {}", context, msg));
        }
        AppError::upstream(context, msg)
    }

    fn into_result(self, context: &str, status: StatusCode) -> Result<T> {
        if !self.success {
            return Err(self.into_error(context, status));
        }
        self.result
            .ok_or_else(|| AppError::upstream(context, "response carried no result"))
    }
}

// ============================================================================
// reqwest implementation
// ============================================================================

pub struct CloudflareClient {
    http: reqwest::Client,
    api_base: String,
    credentials: CloudflareCredentials,
}

impl CloudflareClient {
    pub fn new(api_base: impl Into<String>, credentials: CloudflareCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            credentials,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.api_base, path));
        match &self.credentials {
            CloudflareCredentials::ApiToken(token) => {
                builder.header("Authorization", format!("Bearer {}", token))
            }
            CloudflareCredentials::ApiKey { key, email } => builder
                .header("X-Auth-Key", key)
                .header("X-Auth-Email", email),
        }
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> Result<CfResponse<T>> {
        let resp = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(format!("Cloudflare API ({})", context))
            } else {
                AppError::upstream(context, format!("request failed: {}", e))
            }
        })?;
        let status = resp.status();

        let body: CfResponse<T> = resp.json().await.map_err(|e| {
            if status == StatusCode::NOT_FOUND {
                AppError::NotFound(format!("{}: not found", context))
            } else {
                AppError::upstream(context, format!("unreadable response: {}", e))
            }
        })?;
        if !status.is_success() || !body.success {
            return Err(body.into_error(context, status));
        }
        Ok(body)
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, context: &str) -> Result<T> {
        self.fetch(builder, context)
            .await?
            .into_result(context, StatusCode::OK)
    }

    /// For deletes, whose result payload is not needed
    async fn send_unit(&self, builder: RequestBuilder, context: &str) -> Result<()> {
        self.fetch::<serde_json::Value>(builder, context)
            .await
            .map(|_| ())
    }

    /// Follow `result_info.total_pages` and concatenate every page
    async fn send_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        per_page: u32,
        context: &str,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let builder = self
                .request(Method::GET, path)
                .query(query)
                .query(&[("page", page), ("per_page", per_page)]);
            let body: CfResponse<Vec<T>> = self.fetch(builder, context).await?;
            let total_pages = body.result_info.as_ref().map(|i| i.total_pages).unwrap_or(1);

            let batch = body.result.unwrap_or_default();
            let exhausted = batch.is_empty();
            items.extend(batch);

            if exhausted || page >= total_pages || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        Ok(items)
    }
}

#[async_trait]
impl CloudflareApi for CloudflareClient {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        self.send_all("/accounts", &[], PAGE_SIZE, "list accounts")
            .await
    }

    async fn get_account(&self, account_id: &str) -> Result<Account> {
        self.send(
            self.request(Method::GET, &format!("/accounts/{}", account_id)),
            "get account",
        )
        .await
    }

    async fn list_zones(&self, account_id: &str, filter: &ZoneFilter) -> Result<Vec<Zone>> {
        let mut query = vec![("account.id", account_id.to_string())];
        if let Some(name) = &filter.name {
            query.push(("name", name.clone()));
        }
        if let Some(status) = &filter.status {
            query.push(("status", status.clone()));
        }
        self.send_all("/zones", &query, PAGE_SIZE, "list zones")
            .await
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone> {
        self.send(
            self.request(Method::GET, &format!("/zones/{}", zone_id)),
            "get zone",
        )
        .await
    }

    async fn create_zone(&self, account_id: &str, zone: &NewZone) -> Result<Zone> {
        let body = serde_json::json!({
            "name": zone.name,
            "account": { "id": account_id },
            "jump_start": zone.jump_start,
            "type": zone.zone_type.as_deref().unwrap_or("full"),
        });
        self.send(
            self.request(Method::POST, "/zones").json(&body),
            "create zone",
        )
        .await
    }

    async fn update_zone(&self, zone_id: &str, update: &ZoneUpdate) -> Result<Zone> {
        let mut body = serde_json::Map::new();
        if let Some(paused) = update.paused {
            body.insert("paused".to_string(), paused.into());
        }
        if let Some(servers) = &update.vanity_name_servers {
            body.insert("vanity_name_servers".to_string(), serde_json::json!(servers));
        }
        if body.is_empty() {
            return Err(AppError::BadRequest("No zone fields to update".to_string()));
        }
        self.send(
            self.request(Method::PATCH, &format!("/zones/{}", zone_id))
                .json(&body),
            "update zone",
        )
        .await
    }

    async fn delete_zone(&self, zone_id: &str) -> Result<()> {
        self.send_unit(
            self.request(Method::DELETE, &format!("/zones/{}", zone_id)),
            "delete zone",
        )
        .await
    }

    async fn list_tunnels(&self, account_id: &str) -> Result<Vec<Tunnel>> {
        self.send_all(
            &format!("/accounts/{}/cfd_tunnel", account_id),
            &[("is_deleted", "false".to_string())],
            PAGE_SIZE,
            "list tunnels",
        )
        .await
    }

    async fn get_tunnel(&self, account_id: &str, tunnel_id: &str) -> Result<Tunnel> {
        self.send(
            self.request(
                Method::GET,
                &format!("/accounts/{}/cfd_tunnel/{}", account_id, tunnel_id),
            ),
            "get tunnel",
        )
        .await
    }

    async fn create_tunnel(&self, account_id: &str, name: &str) -> Result<Tunnel> {
        // Generate a random 32-byte secret encoded as Base64
        let raw: [u8; 32] = rand::random();
        let tunnel_secret = base64::engine::general_purpose::STANDARD.encode(raw);

        self.send(
            self.request(Method::POST, &format!("/accounts/{}/cfd_tunnel", account_id))
                .json(&serde_json::json!({
                    "name": name,
                    "config_src": "cloudflare",
                    "tunnel_secret": tunnel_secret,
                })),
            "create tunnel",
        )
        .await
    }

    async fn rename_tunnel(
        &self,
        account_id: &str,
        tunnel_id: &str,
        name: &str,
    ) -> Result<Tunnel> {
        self.send(
            self.request(
                Method::PATCH,
                &format!("/accounts/{}/cfd_tunnel/{}", account_id, tunnel_id),
            )
            .json(&serde_json::json!({ "name": name })),
            "update tunnel",
        )
        .await
    }

    async fn delete_tunnel(&self, account_id: &str, tunnel_id: &str) -> Result<()> {
        self.send_unit(
            self.request(
                Method::DELETE,
                &format!("/accounts/{}/cfd_tunnel/{}", account_id, tunnel_id),
            ),
            "delete tunnel",
        )
        .await
    }

    async fn get_tunnel_token(&self, account_id: &str, tunnel_id: &str) -> Result<String> {
        self.send(
            self.request(
                Method::GET,
                &format!("/accounts/{}/cfd_tunnel/{}/token", account_id, tunnel_id),
            ),
            "get tunnel token",
        )
        .await
    }

    async fn get_tunnel_configuration(
        &self,
        account_id: &str,
        tunnel_id: &str,
    ) -> Result<TunnelConfiguration> {
        self.send(
            self.request(
                Method::GET,
                &format!(
                    "/accounts/{}/cfd_tunnel/{}/configurations",
                    account_id, tunnel_id
                ),
            ),
            "get tunnel configuration",
        )
        .await
    }

    async fn put_tunnel_configuration(
        &self,
        account_id: &str,
        tunnel_id: &str,
        config: &TunnelConfig,
    ) -> Result<TunnelConfiguration> {
        self.send(
            self.request(
                Method::PUT,
                &format!(
                    "/accounts/{}/cfd_tunnel/{}/configurations",
                    account_id, tunnel_id
                ),
            )
            .json(&serde_json::json!({ "config": config })),
            "update tunnel configuration",
        )
        .await
    }

    async fn list_dns_records(&self, zone_id: &str, name: Option<&str>) -> Result<Vec<DnsRecord>> {
        let query: Vec<(&str, String)> = name
            .map(|n| vec![("name.exact", n.to_string())])
            .unwrap_or_default();
        self.send_all(
            &format!("/zones/{}/dns_records", zone_id),
            &query,
            DNS_PAGE_SIZE,
            "list DNS records",
        )
        .await
    }

    async fn create_dns_record(&self, zone_id: &str, record: &DnsRecordInput) -> Result<DnsRecord> {
        self.send(
            self.request(Method::POST, &format!("/zones/{}/dns_records", zone_id))
                .json(record),
            "create DNS record",
        )
        .await
    }

    async fn update_dns_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecordInput,
    ) -> Result<DnsRecord> {
        self.send(
            self.request(
                Method::PUT,
                &format!("/zones/{}/dns_records/{}", zone_id, record_id),
            )
            .json(record),
            "update DNS record",
        )
        .await
    }

    async fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        self.send_unit(
            self.request(
                Method::DELETE,
                &format!("/zones/{}/dns_records/{}", zone_id, record_id),
            ),
            "delete DNS record",
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_success() {
        let body: CfResponse<Vec<Account>> = serde_json::from_str(
            r#"{"success":true,"errors":[],"result":[{"id":"a1","name":"Main"}],
                "result_info":{"page":1,"per_page":50,"total_pages":1}}"#,
        )
        .unwrap();
        let accounts = body.into_result("list accounts", StatusCode::OK).unwrap();
        assert_eq!(accounts[0].id, "a1");
    }

    #[test]
    fn test_envelope_failure_keeps_vendor_text() {
        let body: CfResponse<Zone> = serde_json::from_str(
            r#"{"success":false,"errors":[{"code":1003,"message":"Invalid or missing zone id."}],"result":null}"#,
        )
        .unwrap();
        let err = body
            .into_result("get zone", StatusCode::BAD_REQUEST)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid or missing zone id. (code 1003)"));
        assert!(err.to_string().contains("get zone"));
    }

    #[test]
    fn test_envelope_404_is_not_found() {
        let body: CfResponse<Zone> = serde_json::from_str(
            r#"{"success":false,"errors":[{"code":7003,"message":"Could not route"}]}"#,
        )
        .unwrap();
        assert!(matches!(
            body.into_result("get zone", StatusCode::NOT_FOUND),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_tunnel_configuration_without_config() {
        let cfg: TunnelConfiguration =
            serde_json::from_str(r#"{"tunnel_id":"t1","version":0,"config":null}"#).unwrap();
        assert!(cfg.ingress().is_empty());
    }

    #[test]
    fn test_tunnel_configuration_parses_ingress() {
        let cfg: TunnelConfiguration = serde_json::from_str(
            r#"{"tunnel_id":"t1","config":{"ingress":[
                {"hostname":"app.example.com","service":"http://localhost:8080","originRequest":{}},
                {"service":"http_status:404"}]}}"#,
        )
        .unwrap();
        assert_eq!(cfg.ingress().len(), 2);
        assert!(cfg.ingress()[1].is_catch_all());
    }

    #[test]
    fn test_tunnel_cname_input() {
        let record = DnsRecordInput::tunnel_cname("app.example.com", "T");
        assert_eq!(record.content, "T.cfargotunnel.com");
        assert!(record.proxied);
        assert_eq!(record.ttl, 1);
        assert_eq!(
            serde_json::to_value(&record).unwrap()["type"],
            serde_json::json!("CNAME")
        );
    }

    #[test]
    fn test_is_tunnel_cname_for() {
        let record = DnsRecord {
            id: "r1".to_string(),
            record_type: "CNAME".to_string(),
            name: "app.example.com".to_string(),
            content: "T.cfargotunnel.com".to_string(),
            proxied: true,
            ttl: Some(1),
            comment: None,
            created_on: None,
            modified_on: None,
        };
        assert!(record.is_tunnel_cname_for("app.example.com"));
        assert!(!record.is_tunnel_cname_for("other.example.com"));

        let a_record = DnsRecord {
            record_type: "A".to_string(),
            content: "192.0.2.1".to_string(),
            ..record
        };
        assert!(!a_record.is_tunnel_cname_for("app.example.com"));
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = CloudflareClient::new(
            "https://api.example.test/client/v4/",
            CloudflareCredentials::ApiToken("t".to_string()),
        )
        .unwrap();
        assert_eq!(client.api_base, "https://api.example.test/client/v4");
    }
}

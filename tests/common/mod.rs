//! Shared helpers for router-level integration tests.
//!
//! `FakeCloudflare` keeps accounts, zones, tunnels, tunnel configurations and
//! DNS records in memory and implements `CloudflareApi`, so the whole HTTP
//! surface (hostname saga included) runs without network access.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use tower::util::ServiceExt; // for `oneshot`

use cfproxyhub::config::auth::AuthConfig;
use cfproxyhub::endpoints::create_router;
use cfproxyhub::error::{AppError, Result};
use cfproxyhub::services::cloudflare::{
    Account, CloudflareApi, DnsRecord, DnsRecordInput, NewZone, Tunnel, TunnelConfig,
    TunnelConfiguration, Zone, ZoneFilter, ZoneUpdate,
};
use cfproxyhub::services::ingress::IngressRule;
use cfproxyhub::state::AppState;

pub const ACCOUNT_ID: &str = "acc-1";
pub const ZONE_ID: &str = "zone-example";
pub const TUNNEL_ID: &str = "tun-1";

// ============================================================================
// In-memory Cloudflare
// ============================================================================

#[derive(Default)]
struct FakeData {
    accounts: Vec<Account>,
    zones: Vec<Zone>,
    /// tunnel id -> (account id, tunnel)
    tunnels: HashMap<String, (String, Tunnel)>,
    configs: HashMap<String, TunnelConfig>,
    /// zone id -> records
    records: HashMap<String, Vec<DnsRecord>>,
    next_id: u64,
}

impl FakeData {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

#[derive(Default)]
pub struct FakeCloudflare {
    data: Mutex<FakeData>,
    fail_dns_writes: Mutex<bool>,
    failing_deletes: Mutex<Vec<String>>,
    config_puts: Mutex<usize>,
}

pub fn zone(id: &str, name: &str, status: &str) -> Zone {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "status": status,
        "account": {"id": ACCOUNT_ID, "name": "Main"},
    }))
    .unwrap()
}

fn tunnel(id: &str, name: &str) -> Tunnel {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "name": name,
        "status": "inactive",
    }))
    .unwrap()
}

fn not_found(what: &str, id: &str) -> AppError {
    AppError::NotFound(format!("{} {} not found", what, id))
}

impl FakeCloudflare {
    /// One account, two active zones, one pending zone and one tunnel
    /// without configuration.
    pub fn seeded() -> Arc<Self> {
        let fake = Self::default();
        {
            let mut data = fake.data.lock();
            data.accounts.push(Account {
                id: ACCOUNT_ID.to_string(),
                name: "Main".to_string(),
                account_type: Some("standard".to_string()),
                created_on: None,
                settings: None,
            });
            data.zones.push(zone(ZONE_ID, "example.com", "active"));
            data.zones.push(zone("zone-other", "other.org", "active"));
            data.zones.push(zone("zone-pending", "pending.dev", "pending"));
            data.tunnels.insert(
                TUNNEL_ID.to_string(),
                (ACCOUNT_ID.to_string(), tunnel(TUNNEL_ID, "home")),
            );
        }
        Arc::new(fake)
    }

    pub fn set_ingress(&self, tunnel_id: &str, ingress: Vec<IngressRule>) {
        self.data.lock().configs.insert(
            tunnel_id.to_string(),
            TunnelConfig {
                ingress,
                ..Default::default()
            },
        );
    }

    pub fn set_config(&self, tunnel_id: &str, config: TunnelConfig) {
        self.data.lock().configs.insert(tunnel_id.to_string(), config);
    }

    pub fn config(&self, tunnel_id: &str) -> Option<TunnelConfig> {
        self.data.lock().configs.get(tunnel_id).cloned()
    }

    pub fn ingress(&self, tunnel_id: &str) -> Vec<IngressRule> {
        self.config(tunnel_id).map(|c| c.ingress).unwrap_or_default()
    }

    pub fn records(&self, zone_id: &str) -> Vec<DnsRecord> {
        self.data
            .lock()
            .records
            .get(zone_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn add_record(&self, zone_id: &str, record_type: &str, name: &str, content: &str) -> String {
        let mut data = self.data.lock();
        let id = data.next_id("rec");
        data.records
            .entry(zone_id.to_string())
            .or_default()
            .push(DnsRecord {
                id: id.clone(),
                record_type: record_type.to_string(),
                name: name.to_string(),
                content: content.to_string(),
                proxied: true,
                ttl: Some(1),
                comment: None,
                created_on: None,
                modified_on: None,
            });
        id
    }

    pub fn fail_dns_writes(&self, fail: bool) {
        *self.fail_dns_writes.lock() = fail;
    }

    /// Make deletes of one record fail while other writes keep working
    pub fn fail_delete_of(&self, record_id: &str) {
        self.failing_deletes.lock().push(record_id.to_string());
    }

    pub fn config_puts(&self) -> usize {
        *self.config_puts.lock()
    }

    fn check_dns_writable(&self) -> Result<()> {
        if *self.fail_dns_writes.lock() {
            return Err(AppError::upstream(
                "create DNS record",
                "DNS writes are disabled (code 10000)",
            ));
        }
        Ok(())
    }

    fn tunnel_of(&self, account_id: &str, tunnel_id: &str) -> Result<Tunnel> {
        match self.data.lock().tunnels.get(tunnel_id) {
            Some((owner, t)) if owner == account_id => Ok(t.clone()),
            _ => Err(not_found("Tunnel", tunnel_id)),
        }
    }
}

#[async_trait]
impl CloudflareApi for FakeCloudflare {
    async fn list_accounts(&self) -> Result<Vec<Account>> {
        Ok(self.data.lock().accounts.clone())
    }

    async fn get_account(&self, account_id: &str) -> Result<Account> {
        self.data
            .lock()
            .accounts
            .iter()
            .find(|a| a.id == account_id)
            .cloned()
            .ok_or_else(|| not_found("Account", account_id))
    }

    async fn list_zones(&self, account_id: &str, filter: &ZoneFilter) -> Result<Vec<Zone>> {
        let data = self.data.lock();
        Ok(data
            .zones
            .iter()
            .filter(|z| z.account.as_ref().map(|a| a.id.as_str()) == Some(account_id))
            .filter(|z| {
                filter
                    .name
                    .as_deref()
                    .map_or(true, |n| z.name.eq_ignore_ascii_case(n))
            })
            .filter(|z| filter.status.as_deref().map_or(true, |s| z.status == s))
            .cloned()
            .collect())
    }

    async fn get_zone(&self, zone_id: &str) -> Result<Zone> {
        self.data
            .lock()
            .zones
            .iter()
            .find(|z| z.id == zone_id)
            .cloned()
            .ok_or_else(|| not_found("Zone", zone_id))
    }

    async fn create_zone(&self, account_id: &str, new_zone: &NewZone) -> Result<Zone> {
        let mut data = self.data.lock();
        if data.zones.iter().any(|z| z.name == new_zone.name) {
            return Err(AppError::upstream(
                "create zone",
                format!("{} already exists (code 1061)", new_zone.name),
            ));
        }
        let id = data.next_id("zone");
        let mut created = zone(&id, &new_zone.name, "pending");
        if let Some(account) = created.account.as_mut() {
            account.id = account_id.to_string();
        }
        data.zones.push(created.clone());
        Ok(created)
    }

    async fn update_zone(&self, zone_id: &str, update: &ZoneUpdate) -> Result<Zone> {
        let mut data = self.data.lock();
        let zone = data
            .zones
            .iter_mut()
            .find(|z| z.id == zone_id)
            .ok_or_else(|| not_found("Zone", zone_id))?;
        if let Some(paused) = update.paused {
            zone.paused = paused;
        }
        Ok(zone.clone())
    }

    async fn delete_zone(&self, zone_id: &str) -> Result<()> {
        let mut data = self.data.lock();
        let before = data.zones.len();
        data.zones.retain(|z| z.id != zone_id);
        if data.zones.len() == before {
            return Err(not_found("Zone", zone_id));
        }
        Ok(())
    }

    async fn list_tunnels(&self, account_id: &str) -> Result<Vec<Tunnel>> {
        let data = self.data.lock();
        let mut tunnels: Vec<Tunnel> = data
            .tunnels
            .values()
            .filter(|(owner, _)| owner == account_id)
            .map(|(_, t)| t.clone())
            .collect();
        tunnels.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tunnels)
    }

    async fn get_tunnel(&self, account_id: &str, tunnel_id: &str) -> Result<Tunnel> {
        self.tunnel_of(account_id, tunnel_id)
    }

    async fn create_tunnel(&self, account_id: &str, name: &str) -> Result<Tunnel> {
        let mut data = self.data.lock();
        let id = data.next_id("tun");
        let created = tunnel(&id, name);
        data.tunnels
            .insert(id, (account_id.to_string(), created.clone()));
        Ok(created)
    }

    async fn rename_tunnel(
        &self,
        account_id: &str,
        tunnel_id: &str,
        name: &str,
    ) -> Result<Tunnel> {
        let mut data = self.data.lock();
        match data.tunnels.get_mut(tunnel_id) {
            Some((owner, t)) if owner == account_id => {
                t.name = name.to_string();
                Ok(t.clone())
            }
            _ => Err(not_found("Tunnel", tunnel_id)),
        }
    }

    async fn delete_tunnel(&self, account_id: &str, tunnel_id: &str) -> Result<()> {
        self.tunnel_of(account_id, tunnel_id)?;
        let mut data = self.data.lock();
        data.tunnels.remove(tunnel_id);
        data.configs.remove(tunnel_id);
        Ok(())
    }

    async fn get_tunnel_token(&self, account_id: &str, tunnel_id: &str) -> Result<String> {
        self.tunnel_of(account_id, tunnel_id)?;
        Ok(format!("token-for-{}", tunnel_id))
    }

    async fn get_tunnel_configuration(
        &self,
        account_id: &str,
        tunnel_id: &str,
    ) -> Result<TunnelConfiguration> {
        self.tunnel_of(account_id, tunnel_id)?;
        let config = self.config(tunnel_id);
        // Give concurrent requests a chance to interleave between read and write.
        tokio::task::yield_now().await;
        Ok(TunnelConfiguration {
            tunnel_id: Some(tunnel_id.to_string()),
            version: Some(1),
            config,
            ..Default::default()
        })
    }

    async fn put_tunnel_configuration(
        &self,
        account_id: &str,
        tunnel_id: &str,
        config: &TunnelConfig,
    ) -> Result<TunnelConfiguration> {
        self.tunnel_of(account_id, tunnel_id)?;
        self.set_config(tunnel_id, config.clone());
        *self.config_puts.lock() += 1;
        Ok(TunnelConfiguration {
            tunnel_id: Some(tunnel_id.to_string()),
            version: Some(2),
            config: Some(config.clone()),
            ..Default::default()
        })
    }

    async fn list_dns_records(&self, zone_id: &str, name: Option<&str>) -> Result<Vec<DnsRecord>> {
        Ok(self
            .records(zone_id)
            .into_iter()
            .filter(|r| name.map_or(true, |n| r.name.eq_ignore_ascii_case(n)))
            .collect())
    }

    async fn create_dns_record(&self, zone_id: &str, record: &DnsRecordInput) -> Result<DnsRecord> {
        self.check_dns_writable()?;
        let mut data = self.data.lock();
        let id = data.next_id("rec");
        let created = DnsRecord {
            id,
            record_type: record.record_type.clone(),
            name: record.name.clone(),
            content: record.content.clone(),
            proxied: record.proxied,
            ttl: Some(record.ttl),
            comment: record.comment.clone(),
            created_on: None,
            modified_on: None,
        };
        data.records
            .entry(zone_id.to_string())
            .or_default()
            .push(created.clone());
        Ok(created)
    }

    async fn update_dns_record(
        &self,
        zone_id: &str,
        record_id: &str,
        record: &DnsRecordInput,
    ) -> Result<DnsRecord> {
        self.check_dns_writable()?;
        let mut data = self.data.lock();
        let existing = data
            .records
            .get_mut(zone_id)
            .and_then(|records| records.iter_mut().find(|r| r.id == record_id))
            .ok_or_else(|| not_found("DNS record", record_id))?;
        existing.record_type = record.record_type.clone();
        existing.name = record.name.clone();
        existing.content = record.content.clone();
        existing.proxied = record.proxied;
        Ok(existing.clone())
    }

    async fn delete_dns_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        self.check_dns_writable()?;
        if self.failing_deletes.lock().iter().any(|id| id == record_id) {
            return Err(AppError::upstream(
                "delete DNS record",
                "record is locked (code 81058)",
            ));
        }
        let mut data = self.data.lock();
        let records = data
            .records
            .get_mut(zone_id)
            .ok_or_else(|| not_found("DNS record", record_id))?;
        let before = records.len();
        records.retain(|r| r.id != record_id);
        if records.len() == before {
            return Err(not_found("DNS record", record_id));
        }
        Ok(())
    }
}

// ============================================================================
// Router helpers
// ============================================================================

pub fn web_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("web")
}

/// State with the fake Cloudflare client and no Docker daemon
pub fn test_state(fake: Arc<FakeCloudflare>) -> AppState {
    let cloudflare: Arc<dyn CloudflareApi> = fake;
    AppState::new(Some(cloudflare), None, AuthConfig::default(), web_dir())
}

/// State with neither Cloudflare credentials nor Docker
pub fn bare_state() -> AppState {
    AppState::new(None, None, AuthConfig::default(), web_dir())
}

pub fn test_app(state: AppState) -> Router {
    create_router(state)
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestResponse {
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap_or_default()
    }

    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8_lossy(&bytes).to_string();
    let body = serde_json::from_str(&text).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
        text,
    }
}

/// Log in with the default admin credentials and return the `Cookie` header value
pub async fn login(app: &Router) -> String {
    let response = send(
        app,
        "POST",
        "/api/auth/login",
        None,
        Some(serde_json::json!({"username": "admin", "password": "password123"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "login failed: {}", response.text);

    let set_cookie = response
        .headers
        .get(header::SET_COOKIE)
        .expect("login sets a cookie")
        .to_str()
        .unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

/// Log in and select the seeded account
pub async fn login_with_account(app: &Router) -> String {
    let cookie = login(app).await;
    let response = send(
        app,
        "POST",
        "/api/current-account",
        Some(&cookie),
        Some(serde_json::json!({"account_id": ACCOUNT_ID, "account_name": "Main"})),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK);
    cookie
}

pub fn hostnames_uri(tunnel_id: &str) -> String {
    format!(
        "/api/cloudflare/accounts/{}/tunnels/{}/hostnames",
        ACCOUNT_ID, tunnel_id
    )
}

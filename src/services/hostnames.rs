//! Public hostname management for remotely configured tunnels
//!
//! Each operation is a two-step saga:
//!
//! 1. Rewrite the tunnel's ingress list (fetch, modify, push). This step
//!    decides whether the request succeeds.
//! 2. Reconcile the proxied CNAME pointing the hostname at
//!    `<tunnel id>.cfargotunnel.com`. DNS failures never fail the request and
//!    are never rolled back; they are reported in [`DnsOutcome`].
//!
//! Ingress edits issued through this process are serialized per tunnel by
//! [`TunnelLocks`]. Edits made elsewhere (dashboard, other replicas) can still
//! interleave with ours, since the API offers no compare-and-swap.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::OwnedMutexGuard;

use crate::error::Result;
use crate::services::cloudflare::{CloudflareApi, DnsRecord, DnsRecordInput, TunnelConfig};
use crate::services::domain::find_zone_for_hostname;
use crate::services::ingress::{self, IngressRule};

// ============================================================================
// Per-tunnel locking
// ============================================================================

/// One async mutex per tunnel id, held across fetch-modify-push
#[derive(Clone, Default)]
pub struct TunnelLocks {
    locks: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl TunnelLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, tunnel_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock();
            locks
                .entry(tunnel_id.to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

// ============================================================================
// Outcome types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DnsAction {
    Create,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsStep {
    pub action: DnsAction,
    pub name: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Result of the advisory DNS step. `ok` is true when nothing failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsOutcome {
    pub attempted: bool,
    pub ok: bool,
    pub steps: Vec<DnsStep>,
}

impl DnsOutcome {
    pub fn skipped() -> Self {
        Self {
            attempted: false,
            ok: true,
            steps: Vec::new(),
        }
    }

    fn from_steps(steps: Vec<DnsStep>) -> Self {
        Self {
            attempted: true,
            ok: steps.iter().all(|s| s.ok),
            steps,
        }
    }

    /// First failure reason, for user-facing messages
    pub fn failure_reason(&self) -> Option<&str> {
        self.steps
            .iter()
            .find(|s| !s.ok)
            .and_then(|s| s.reason.as_deref())
    }
}

/// Response payload of a hostname create/update/delete
#[derive(Debug, Clone, Serialize)]
pub struct HostnameChange {
    pub hostname: String,
    /// Ingress list as pushed to the tunnel
    pub ingress: Vec<IngressRule>,
    pub dns: DnsOutcome,
}

// ============================================================================
// Saga
// ============================================================================

pub struct HostnameSync<'a> {
    api: &'a dyn CloudflareApi,
    locks: &'a TunnelLocks,
}

impl<'a> HostnameSync<'a> {
    pub fn new(api: &'a dyn CloudflareApi, locks: &'a TunnelLocks) -> Self {
        Self { api, locks }
    }

    /// Routed (non catch-all) rules; a tunnel without configuration has none.
    pub async fn list(&self, account_id: &str, tunnel_id: &str) -> Result<Vec<IngressRule>> {
        let current = self
            .api
            .get_tunnel_configuration(account_id, tunnel_id)
            .await?;
        Ok(ingress::routed(current.ingress()))
    }

    pub async fn create(
        &self,
        account_id: &str,
        tunnel_id: &str,
        rule: IngressRule,
    ) -> Result<HostnameChange> {
        let hostname = rule.hostname().to_string();

        let pushed = {
            let _guard = self.locks.lock(tunnel_id).await;
            // New tunnels have no configuration yet; start from an empty one.
            let config = match self.api.get_tunnel_configuration(account_id, tunnel_id).await {
                Ok(current) => current.config.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(
                        "Could not read configuration of tunnel {}, starting empty: {}",
                        tunnel_id,
                        e
                    );
                    TunnelConfig::default()
                }
            };
            let rules = ingress::plan_create(&config.ingress, rule);
            self.push(account_id, tunnel_id, config, rules).await?
        };
        tracing::info!("Added {} to tunnel {}", hostname, tunnel_id);

        let dns = if hostname.is_empty() {
            DnsOutcome::skipped()
        } else {
            DnsOutcome::from_steps(vec![
                self.create_cname(account_id, tunnel_id, &hostname).await,
            ])
        };

        Ok(HostnameChange {
            hostname,
            ingress: pushed,
            dns,
        })
    }

    pub async fn update(
        &self,
        account_id: &str,
        tunnel_id: &str,
        target: &str,
        replacement: IngressRule,
    ) -> Result<HostnameChange> {
        let hostname = replacement.hostname().to_string();

        let pushed = {
            let _guard = self.locks.lock(tunnel_id).await;
            let config = self.current_config(account_id, tunnel_id).await?;
            let rules = ingress::plan_update(&config.ingress, target, replacement)?;
            self.push(account_id, tunnel_id, config, rules).await?
        };
        tracing::info!("Updated {} on tunnel {}", target, tunnel_id);

        let renamed = !hostname.is_empty() && !hostname.eq_ignore_ascii_case(target.trim());
        let dns = if renamed {
            let mut steps = self.delete_cnames(account_id, target).await;
            steps.push(self.create_cname(account_id, tunnel_id, &hostname).await);
            DnsOutcome::from_steps(steps)
        } else {
            DnsOutcome::skipped()
        };

        Ok(HostnameChange {
            hostname,
            ingress: pushed,
            dns,
        })
    }

    pub async fn delete(
        &self,
        account_id: &str,
        tunnel_id: &str,
        target: &str,
    ) -> Result<HostnameChange> {
        let pushed = {
            let _guard = self.locks.lock(tunnel_id).await;
            let config = self.current_config(account_id, tunnel_id).await?;
            let rules = ingress::plan_delete(&config.ingress, target)?;
            self.push(account_id, tunnel_id, config, rules).await?
        };
        tracing::info!("Removed {} from tunnel {}", target, tunnel_id);

        let dns = DnsOutcome::from_steps(self.delete_cnames(account_id, target).await);

        Ok(HostnameChange {
            hostname: target.trim().to_string(),
            ingress: pushed,
            dns,
        })
    }

    // ------------------------------------------------------------------------
    // Ingress step
    // ------------------------------------------------------------------------

    async fn current_config(&self, account_id: &str, tunnel_id: &str) -> Result<TunnelConfig> {
        let current = self
            .api
            .get_tunnel_configuration(account_id, tunnel_id)
            .await?;
        Ok(current.config.unwrap_or_default())
    }

    /// Submit the full list, keeping the config's other top-level settings
    async fn push(
        &self,
        account_id: &str,
        tunnel_id: &str,
        mut config: TunnelConfig,
        rules: Vec<IngressRule>,
    ) -> Result<Vec<IngressRule>> {
        config.ingress = rules;
        let stored = self
            .api
            .put_tunnel_configuration(account_id, tunnel_id, &config)
            .await?;

        match stored.config {
            Some(c) if !c.ingress.is_empty() => Ok(c.ingress),
            _ => Ok(config.ingress),
        }
    }

    // ------------------------------------------------------------------------
    // DNS step (advisory)
    // ------------------------------------------------------------------------

    async fn create_cname(&self, account_id: &str, tunnel_id: &str, hostname: &str) -> DnsStep {
        let result: Result<DnsRecord> = async {
            let zone = find_zone_for_hostname(self.api, account_id, hostname).await?;
            let record = DnsRecordInput::tunnel_cname(hostname, tunnel_id);
            self.api.create_dns_record(&zone.id, &record).await
        }
        .await;

        match result {
            Ok(record) => {
                tracing::info!("Created CNAME {} -> {}", hostname, record.content);
                DnsStep {
                    action: DnsAction::Create,
                    name: hostname.to_string(),
                    ok: true,
                    record_id: Some(record.id),
                    reason: None,
                }
            }
            Err(e) => {
                tracing::warn!("Failed to create DNS record for {}: {}", hostname, e);
                DnsStep {
                    action: DnsAction::Create,
                    name: hostname.to_string(),
                    ok: false,
                    record_id: None,
                    reason: Some(e.to_string()),
                }
            }
        }
    }

    /// Delete every tunnel CNAME for `hostname` in its zone, one step per
    /// record. A failed delete does not stop the remaining ones.
    async fn delete_cnames(&self, account_id: &str, hostname: &str) -> Vec<DnsStep> {
        let hostname = hostname.trim();
        let step = |ok: bool, record_id: Option<String>, reason: Option<String>| DnsStep {
            action: DnsAction::Delete,
            name: hostname.to_string(),
            ok,
            record_id,
            reason,
        };

        let lookup: Result<(String, Vec<DnsRecord>)> = async {
            let zone = find_zone_for_hostname(self.api, account_id, hostname).await?;
            let records = self.api.list_dns_records(&zone.id, Some(hostname)).await?;
            Ok((zone.id, records))
        }
        .await;

        let (zone_id, records) = match lookup {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!("Failed to look up DNS records for {}: {}", hostname, e);
                return vec![step(false, None, Some(e.to_string()))];
            }
        };

        let targets: Vec<&DnsRecord> = records
            .iter()
            .filter(|r| r.is_tunnel_cname_for(hostname))
            .collect();
        if targets.is_empty() {
            return vec![step(
                true,
                None,
                Some("no tunnel CNAME record found".to_string()),
            )];
        }

        let mut steps = Vec::with_capacity(targets.len());
        for record in targets {
            match self.api.delete_dns_record(&zone_id, &record.id).await {
                Ok(()) => {
                    tracing::info!("Deleted CNAME {} ({})", hostname, record.id);
                    steps.push(step(true, Some(record.id.clone()), None));
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to delete DNS record {} for {}: {}",
                        record.id,
                        hostname,
                        e
                    );
                    steps.push(step(false, Some(record.id.clone()), Some(e.to_string())));
                }
            }
        }
        steps
    }
}

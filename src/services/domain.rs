//! Hostname -> Cloudflare zone resolution

use crate::error::{AppError, Result};
use crate::services::cloudflare::{CloudflareApi, Zone, ZoneFilter};

/// Presumed registrable domain: the last two dot-separated labels.
///
/// Multi-label public suffixes are not recognised, so `foo.co.uk` yields
/// `co.uk`.
pub fn extract_domain(hostname: &str) -> String {
    let hostname = hostname.trim().trim_end_matches('.');
    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() <= 2 {
        return hostname.to_string();
    }
    labels[labels.len() - 2..].join(".")
}

/// Exact (case-insensitive) zone name match within the account
pub async fn find_zone_by_name(
    api: &dyn CloudflareApi,
    account_id: &str,
    name: &str,
) -> Result<Zone> {
    let filter = ZoneFilter {
        name: Some(name.to_string()),
        ..Default::default()
    };
    api.list_zones(account_id, &filter)
        .await?
        .into_iter()
        .find(|zone| zone.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| AppError::NotFound(format!("No zone found for domain {}", name)))
}

/// Zone that should hold DNS records for `hostname`
pub async fn find_zone_for_hostname(
    api: &dyn CloudflareApi,
    account_id: &str,
    hostname: &str,
) -> Result<Zone> {
    find_zone_by_name(api, account_id, &extract_domain(hostname)).await
}

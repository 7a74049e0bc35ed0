//! Tunnel ingress list reconciliation
//!
//! The Cloudflare API replaces a tunnel's whole ingress list on every write,
//! so each edit rebuilds the complete list from the current snapshot. Rebuilt
//! lists always end with exactly one catch-all rule.

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

pub const CATCH_ALL_SERVICE: &str = "http_status:404";

/// One hostname -> origin mapping of a cloudflared tunnel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngressRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    pub service: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(
        rename = "originRequest",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub origin_request: Option<serde_json::Value>,
}

impl IngressRule {
    pub fn new(hostname: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
            service: service.into(),
            ..Default::default()
        }
    }

    pub fn catch_all() -> Self {
        Self {
            service: CATCH_ALL_SERVICE.to_string(),
            ..Default::default()
        }
    }

    pub fn hostname(&self) -> &str {
        self.hostname.as_deref().map(str::trim).unwrap_or_default()
    }

    /// Rules without a hostname are not carried across edits; only the
    /// trailing 404 rule is put back.
    pub fn is_catch_all(&self) -> bool {
        self.hostname().is_empty()
    }

    /// Hostnames compare ASCII case-insensitively, as DNS does.
    pub fn matches(&self, hostname: &str) -> bool {
        !self.hostname().is_empty() && self.hostname().eq_ignore_ascii_case(hostname.trim())
    }
}

fn hostname_not_found(hostname: &str) -> AppError {
    AppError::NotFound(format!(
        "Hostname {} not found in tunnel configuration",
        hostname
    ))
}

/// Existing routed rules plus `rule`, then the catch-all.
///
/// A second rule for an already routed hostname is not rejected here; the
/// Cloudflare API validates the submitted list.
pub fn plan_create(existing: &[IngressRule], rule: IngressRule) -> Vec<IngressRule> {
    let mut rules: Vec<IngressRule> = existing
        .iter()
        .filter(|r| !r.is_catch_all())
        .cloned()
        .collect();
    rules.push(rule);
    rules.push(IngressRule::catch_all());
    rules
}

/// Replace the rule for `target` in place. Fails if `target` is not routed.
pub fn plan_update(
    existing: &[IngressRule],
    target: &str,
    replacement: IngressRule,
) -> Result<Vec<IngressRule>> {
    let mut found = false;
    let mut rules = Vec::with_capacity(existing.len() + 1);

    for rule in existing.iter().filter(|r| !r.is_catch_all()) {
        if rule.matches(target) {
            found = true;
            rules.push(replacement.clone());
        } else {
            rules.push(rule.clone());
        }
    }

    if !found {
        return Err(hostname_not_found(target));
    }
    rules.push(IngressRule::catch_all());
    Ok(rules)
}

/// Drop every rule for `target`. Fails if `target` is not routed.
pub fn plan_delete(existing: &[IngressRule], target: &str) -> Result<Vec<IngressRule>> {
    let before = existing.iter().filter(|r| !r.is_catch_all()).count();
    let mut rules: Vec<IngressRule> = existing
        .iter()
        .filter(|r| !r.is_catch_all() && !r.matches(target))
        .cloned()
        .collect();

    if rules.len() == before {
        return Err(hostname_not_found(target));
    }
    rules.push(IngressRule::catch_all());
    Ok(rules)
}

/// Routed rules only, in list order
pub fn routed(rules: &[IngressRule]) -> Vec<IngressRule> {
    rules.iter().filter(|r| !r.is_catch_all()).cloned().collect()
}

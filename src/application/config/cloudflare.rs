use std::env;

pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// How requests to the Cloudflare API authenticate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudflareCredentials {
    /// Scoped API token, sent as `Authorization: Bearer`
    ApiToken(String),
    /// Global API key, sent as `X-Auth-Key` + `X-Auth-Email`
    ApiKey { key: String, email: String },
}

#[derive(Debug, Clone)]
pub struct CloudflareConfig {
    pub api_token: Option<String>,
    pub api_key: Option<String>,
    pub email: Option<String>,
    pub api_base: String,
}

impl CloudflareConfig {
    pub fn from_env() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            api_token: non_empty("CLOUDFLARE_API_TOKEN"),
            api_key: non_empty("CLOUDFLARE_API_KEY"),
            email: non_empty("CLOUDFLARE_EMAIL"),
            api_base: env::var("CLOUDFLARE_API_BASE")
                .unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
        }
    }

    /// Resolve credentials: a token wins, otherwise key + email are both required.
    pub fn credentials(&self) -> Option<CloudflareCredentials> {
        if let Some(token) = &self.api_token {
            return Some(CloudflareCredentials::ApiToken(token.clone()));
        }
        match (&self.api_key, &self.email) {
            (Some(key), Some(email)) => Some(CloudflareCredentials::ApiKey {
                key: key.clone(),
                email: email.clone(),
            }),
            _ => None,
        }
    }
}

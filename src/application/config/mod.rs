pub mod auth;
pub mod cloudflare;
pub mod server;

use once_cell::sync::Lazy;
use std::env;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server: server::ServerConfig,
    pub auth: auth::AuthConfig,
    pub cloudflare: cloudflare::CloudflareConfig,

    pub version: String,

    // Logging
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Self {
        // A missing .env file is fine; the process environment still applies.
        let _ = dotenvy::dotenv();

        Self {
            server: server::ServerConfig::from_env(),
            auth: auth::AuthConfig::from_env(),
            cloudflare: cloudflare::CloudflareConfig::from_env(),

            version: env!("CARGO_PKG_VERSION").to_string(),

            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string()),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);

/// Parse a boolean-ish environment value (`true`, `1`, `yes`)
pub(crate) fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

use std::env;

/// Single shared-secret login for the dashboard
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: String,
    /// Adds the `Secure` attribute to the session cookie
    pub cookie_secure: bool,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        Self {
            admin_username: env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".to_string()),
            admin_password: env::var("ADMIN_PASSWORD")
                .unwrap_or_else(|_| "password123".to_string()),
            cookie_secure: super::env_flag("COOKIE_SECURE"),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_password: "password123".to_string(),
            cookie_secure: false,
        }
    }
}

pub mod auth;
pub mod security_headers;

pub use auth::require_session;
pub use auth::AuthenticatedSession;
pub use security_headers::security_headers;

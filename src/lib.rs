pub mod application;
pub mod endpoints;
pub mod middleware;
pub mod services;

// Re-export from application for convenience
pub use application::config;
pub use application::error;
pub use application::response;
pub use application::state;

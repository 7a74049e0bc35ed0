pub mod cloudflare;
pub mod docker;
pub mod domain;
pub mod hostnames;
pub mod ingress;
pub mod session;

pub use cloudflare::{CloudflareApi, CloudflareClient};
pub use docker::DockerService;
pub use hostnames::{HostnameSync, TunnelLocks};
pub use session::{InMemorySessionStore, SessionStore};

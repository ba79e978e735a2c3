//! Organizations (tenants) and the social platform accounts connected to them.

pub mod model;
pub mod repository;
pub mod service;

pub use model::{Organization, Platform, SocialConnection, SocialConnectionView};
pub use repository::{InMemoryRepository, Repository};
pub use service::{TenantCacheStats, TenantService};

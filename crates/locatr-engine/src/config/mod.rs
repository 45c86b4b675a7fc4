pub mod loader;
pub mod schema;

pub use loader::{CONFIG_ENV, ConfigError, ConfigLoader};
pub use schema::{CacheConfig, LocatrConfig, ModeConfig, ModeKind, SearchConfig};

pub mod client;
pub mod completion;
pub mod dom;
pub mod error;
pub mod geometry;
pub mod plugin;

pub use client::{LlmClient, RerankerClient};
pub use completion::{
    CacheEntry, JsonCompletion, LlmCompletionMeta, LocatrCompletion, RerankRequest, RerankResult,
};
pub use dom::{
    Dom, DomMetadata, ElementSpec, LocatorMap, LocatorType, extract_first_unique_id,
    generate_unique_id,
};
pub use error::{ClientError, PluginError};
pub use geometry::{Location, Point, Resolution};
pub use plugin::Plugin;

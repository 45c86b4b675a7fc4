//! Natural-language element location: retrieval modes, the locator cache,
//! coordinate mapping and the `Locatr` façade.

pub mod cache;
pub mod config;
pub mod coords;
pub mod error;
pub mod locatr;
pub mod logging;
pub mod mode;
pub mod plugins;
pub mod search;

pub use cache::{CacheError, DEFAULT_CACHE_PATH, LocatorCache};
pub use config::{ConfigError, ConfigLoader, LocatrConfig};
pub use coords::{Letterbox, letterbox_png, remap_point, remap_point_inverse, scale_and_pad};
pub use error::LocateError;
pub use locatr::{Locatr, LocatrBuilder};
pub use mode::{DomAnalysisMode, LocateMode, VisualAnalysisMode, sort_rerank_chunks};
pub use plugins::SourcePlugin;
pub use search::{SearchError, find_element_location, find_locators_at};

//! Context-keyed store of resolved requests.
//!
//! The in-memory map is mutated without locking; callers that share one
//! cache between tasks must serialize access themselves. Entries never
//! expire.

use locatr_common::{CacheEntry, Plugin};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_CACHE_PATH: &str = ".locatr.cache";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to access cache file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse cache file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocatorCache {
    path: PathBuf,
    entries: BTreeMap<String, Vec<CacheEntry>>,
}

impl LocatorCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Read the cache file. A missing or empty file yields an empty cache.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let mut cache = Self::new(path);
        let content = match tokio::fs::read(&cache.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cache file at {}", cache.path.display());
                return Ok(cache);
            }
            Err(e) => return Err(e.into()),
        };
        if content.iter().all(u8::is_ascii_whitespace) {
            return Ok(cache);
        }
        cache.entries = serde_json::from_slice(&content)?;
        info!(
            "Loaded cache from {} ({} contexts)",
            cache.path.display(),
            cache.entries.len()
        );
        Ok(cache)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &BTreeMap<String, Vec<CacheEntry>> {
        &self.entries
    }

    /// Cached resolution of `request` in `context`, keeping only locators
    /// that still resolve on the live page. Entries with no valid locator
    /// are skipped.
    pub async fn get<P: Plugin + ?Sized>(
        &self,
        context: &str,
        request: &str,
        plugin: &mut P,
    ) -> Option<CacheEntry> {
        let entries = self.entries.get(context)?;
        for entry in entries.iter().filter(|e| e.user_request == request) {
            let mut valid = Vec::new();
            for locator in &entry.locators {
                match plugin.is_locator_valid(locator).await {
                    Ok(true) => valid.push(locator.clone()),
                    Ok(false) => debug!(locator = %locator, "Cached locator is stale"),
                    Err(e) => debug!(locator = %locator, error = %e, "Cached locator check failed"),
                }
            }
            if !valid.is_empty() {
                return Some(CacheEntry {
                    user_request: entry.user_request.clone(),
                    locators: valid,
                    locator_type: entry.locator_type,
                });
            }
        }
        None
    }

    pub fn put(&mut self, context: impl Into<String>, entry: CacheEntry) {
        self.entries.entry(context.into()).or_default().push(entry);
    }

    /// Write the whole cache as JSON, creating parent directories.
    pub async fn persist(&self) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let content = serde_json::to_vec(&self.entries)?;
        tokio::fs::write(&self.path, content).await?;
        debug!("Wrote cache to {}", self.path.display());
        Ok(())
    }
}

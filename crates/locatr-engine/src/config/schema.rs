use crate::cache::DEFAULT_CACHE_PATH;
use locatr_common::Resolution;
use locatr_dom::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocatrConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub mode: ModeConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_cache_path")]
    pub path: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_cache_path(),
        }
    }
}

fn default_cache_path() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_PATH)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModeKind {
    #[default]
    DomAnalysis,
    VisualAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {
    #[serde(default)]
    pub kind: ModeKind,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Defaults depend on `kind`: 3 for DOM analysis, 10 for visual analysis.
    #[serde(default)]
    pub max_attempts: Option<usize>,
    #[serde(default = "default_chunks_per_attempt")]
    pub chunks_per_attempt: usize,
    #[serde(default)]
    pub resolution: Resolution,
}

impl Default for ModeConfig {
    fn default() -> Self {
        Self {
            kind: ModeKind::default(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_attempts: None,
            chunks_per_attempt: default_chunks_per_attempt(),
            resolution: Resolution::default(),
        }
    }
}

impl ModeConfig {
    pub fn max_attempts(&self) -> usize {
        match (self.max_attempts, self.kind) {
            (Some(n), _) if n > 0 => n,
            (_, ModeKind::DomAnalysis) => 3,
            (_, ModeKind::VisualAnalysis) => 10,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

fn default_chunks_per_attempt() -> usize {
    3
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl SearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_timeout_ms() -> u64 {
    3000
}

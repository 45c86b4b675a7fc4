use crate::cache::CacheError;
use locatr_common::{ClientError, LlmCompletionMeta, PluginError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LocateError {
    /// Attempts exhausted; `usage` holds the tokens spent getting there.
    #[error("no relevant element ID found in the DOM")]
    NoElementId { usage: LlmCompletionMeta },

    #[error("no relevant element point found in the DOM")]
    NoElementPoint { usage: LlmCompletionMeta },

    #[error("Plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("Reranker error: {0}")]
    Reranker(#[from] ClientError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("At least two locators are required for comparison, got {0}")]
    NotEnoughLocators(usize),
}

impl LocateError {
    /// LLM usage accumulated before the failure, when the request got that far.
    pub fn usage(&self) -> Option<&LlmCompletionMeta> {
        match self {
            LocateError::NoElementId { usage } | LocateError::NoElementPoint { usage } => {
                Some(usage)
            }
            _ => None,
        }
    }
}

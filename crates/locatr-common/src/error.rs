use thiserror::Error;

/// Errors raised by a `Plugin` implementation. The engine propagates these
/// unchanged; they abort the current call only.
#[derive(Debug, Clone, Error)]
pub enum PluginError {
    #[error("Operation not supported by this plugin: {0}")]
    NotSupported(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Invalid page source: {0}")]
    InvalidSource(String),

    #[error("Invalid locator '{locator}': {reason}")]
    InvalidLocator { locator: String, reason: String },

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors raised by the LLM and reranker clients.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

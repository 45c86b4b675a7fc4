use crate::dom::LocatorType;
use serde::{Deserialize, Serialize};

/// Token accounting for the LLM calls made while serving one request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmCompletionMeta {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(rename = "llm_provider")]
    pub provider: String,
    #[serde(rename = "llm_model")]
    pub model: String,
}

impl LlmCompletionMeta {
    /// Cost in the currency of the given per-million-token prices.
    pub fn calculate_cost(&self, cost_per_1m_input: f64, cost_per_1m_output: f64) -> f64 {
        let input = self.input_tokens as f64 / 1_000_000.0 * cost_per_1m_input;
        let output = self.output_tokens as f64 / 1_000_000.0 * cost_per_1m_output;
        input + output
    }
}

/// Raw JSON answer from an LLM together with its token usage.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JsonCompletion {
    #[serde(rename = "json_value")]
    pub json: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Result of a `Locate` call. `locators` is never empty on success.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LocatrCompletion {
    pub locators: Vec<String>,
    pub locator_type: Option<LocatorType>,
    pub cache_hit: bool,
    #[serde(flatten)]
    pub meta: LlmCompletionMeta,
    pub elapsed_ms: u64,
}

impl LocatrCompletion {
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            meta: LlmCompletionMeta {
                provider: provider.into(),
                model: model.into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Fold one LLM call's usage into the running totals.
    pub fn add_usage(&mut self, completion: &JsonCompletion) {
        self.meta.input_tokens += completion.input_tokens;
        self.meta.output_tokens += completion.output_tokens;
    }
}

/// A cached resolution for one natural-language request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub user_request: String,
    pub locators: Vec<String>,
    pub locator_type: LocatorType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RerankRequest {
    pub query: String,
    pub documents: Vec<String>,
    pub top_n: usize,
}

/// Relevance of `documents[index]`; higher scores rank first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RerankResult {
    pub index: usize,
    pub score: f64,
}

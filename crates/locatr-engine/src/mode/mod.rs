//! Retrieval strategies. Each mode turns a natural-language request into
//! locators on the plugin's current page.

pub mod dom_analysis;
pub mod visual_analysis;

pub use dom_analysis::DomAnalysisMode;
pub use visual_analysis::VisualAnalysisMode;

use crate::config::{ModeConfig, ModeKind};
use crate::error::LocateError;
use async_trait::async_trait;
use locatr_common::{
    Dom, LlmClient, LocatrCompletion, Plugin, RerankRequest, RerankResult, RerankerClient,
};
use locatr_dom::HtmlSplitter;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use tracing::info;

#[async_trait]
pub trait LocateMode: Send + Sync {
    fn name(&self) -> &str;

    /// Fill `completion.locators` and `completion.locator_type` on success.
    /// Token usage is accumulated even when the call fails.
    async fn process_request(
        &self,
        request: &str,
        plugin: &mut dyn Plugin,
        llm: &dyn LlmClient,
        reranker: &dyn RerankerClient,
        completion: &mut LocatrCompletion,
    ) -> Result<(), LocateError>;
}

pub fn from_config(config: &ModeConfig) -> Box<dyn LocateMode> {
    let splitter =
        HtmlSplitter::with_chunk_size(config.chunk_size).chunk_overlap(config.chunk_overlap);
    match config.kind {
        ModeKind::DomAnalysis => Box::new(
            DomAnalysisMode::default()
                .with_splitter(splitter)
                .with_max_attempts(config.max_attempts())
                .with_chunks_per_attempt(config.chunks_per_attempt),
        ),
        ModeKind::VisualAnalysis => Box::new(
            VisualAnalysisMode::default()
                .with_splitter(splitter)
                .with_max_attempts(config.max_attempts())
                .with_resolution(config.resolution),
        ),
    }
}

/// Reorder chunks by descending rerank score, keeping at most `top_n`.
///
/// Results pointing outside `chunks` are ignored. If none remain, the
/// original order is kept.
pub fn sort_rerank_chunks(
    mut chunks: Vec<String>,
    results: &[RerankResult],
    top_n: usize,
) -> Vec<String> {
    let mut valid: Vec<RerankResult> = results
        .iter()
        .copied()
        .filter(|r| r.index < chunks.len())
        .collect();
    if valid.is_empty() {
        chunks.truncate(top_n);
        return chunks;
    }
    valid.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut seen = HashSet::new();
    valid
        .into_iter()
        .filter(|r| seen.insert(r.index))
        .take(top_n)
        .map(|r| chunks[r.index].clone())
        .collect()
}

/// Split the serialized tree and order the chunks by relevance to `request`.
pub(crate) async fn ranked_chunks(
    request: &str,
    dom: &Dom,
    splitter: &HtmlSplitter,
    top_n: usize,
    reranker: &dyn RerankerClient,
) -> Result<Vec<String>, LocateError> {
    let repr = dom.root_element.repr();
    let chunks: Vec<String> = splitter.split(&repr).into_iter().map(str::to_string).collect();
    if chunks.is_empty() {
        return Ok(chunks);
    }

    let results = reranker
        .rerank(RerankRequest {
            query: request.to_string(),
            documents: chunks.clone(),
            top_n,
        })
        .await?;
    let ranked = sort_rerank_chunks(chunks, &results, top_n);
    info!("Max chunks to process: {}", ranked.len());
    Ok(ranked)
}

/// Parse a model's JSON answer, tolerating a surrounding markdown code fence.
pub fn parse_llm_json<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(strip_code_fence(raw))
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = body.strip_prefix("json").unwrap_or(body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("  {\"a\":1} "), "{\"a\":1}");
    }
}

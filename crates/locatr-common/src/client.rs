use crate::completion::{JsonCompletion, RerankRequest, RerankResult};
use crate::error::ClientError;
use async_trait::async_trait;

/// A language model able to answer with a JSON document.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name, e.g. "anthropic".
    fn provider(&self) -> &str;

    fn model(&self) -> &str;

    /// Ask for a JSON completion, optionally attaching a PNG screenshot.
    async fn get_json_completion(
        &self,
        prompt: &str,
        image: Option<&[u8]>,
    ) -> Result<JsonCompletion, ClientError>;
}

/// Orders documents by relevance to a query.
#[async_trait]
pub trait RerankerClient: Send + Sync {
    async fn rerank(&self, request: RerankRequest) -> Result<Vec<RerankResult>, ClientError>;
}

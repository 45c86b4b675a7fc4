use super::{LocateMode, parse_llm_json, ranked_chunks};
use crate::error::LocateError;
use crate::logging::Topic;
use async_trait::async_trait;
use locatr_common::{LlmClient, LocatrCompletion, Plugin, RerankerClient};
use locatr_dom::HtmlSplitter;
use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_MAX_ATTEMPTS: usize = 3;
pub const DEFAULT_CHUNKS_PER_ATTEMPT: usize = 3;

pub fn dom_analysis_prompt(dom: &str, request: &str) -> String {
    format!(
        r#"Your task is to identify the element that matches a user's requirement from a given DOM structure and return its unique_id in a JSON format. If the element is not found, provide an appropriate error message in the JSON output.

Each element may contain an attribute called "data-supported-primitives" which indicates its supported interactions. The following attributes determine whether an element is "clickable", "hoverable", "inputable", or "selectable":

1. "clickable": The element supports click interactions and will have "data-supported-primitives" set to "click".
2. "hoverable": The element supports hover interactions and will have "data-supported-primitives" set to "hover".
3. "inputable": The element supports text input interactions and will have "data-supported-primitives" set to "input_text". If this attribute is not present then the input is read-only.
4. "selectable": The element supports selecting options and will have "data-supported-primitives" set to "select_option".

Provide your response in valid JSON format with the following structure:
{{
  "element_id": "str",     // The id attribute of the element that matches the user's requirement.
  "error": "str"           // An appropriate error message if the element is not found.
}}

Input:
{{
  "dom": "{dom}",
  "user_request": "{request}"
}}
Process the input accordingly and ensure that if the element is not found, the "error" field contains a relevant message.
"#
    )
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DomAnalysisOutput {
    element_id: Option<String>,
    error: Option<String>,
}

/// Text-only strategy: the model picks an element id out of reranked chunks
/// of the serialized tree.
#[derive(Debug, Clone)]
pub struct DomAnalysisMode {
    splitter: HtmlSplitter,
    max_attempts: usize,
    chunks_per_attempt: usize,
}

impl Default for DomAnalysisMode {
    fn default() -> Self {
        Self {
            splitter: HtmlSplitter::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            chunks_per_attempt: DEFAULT_CHUNKS_PER_ATTEMPT,
        }
    }
}

impl DomAnalysisMode {
    pub fn with_splitter(mut self, splitter: HtmlSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_chunks_per_attempt(mut self, chunks_per_attempt: usize) -> Self {
        self.chunks_per_attempt = chunks_per_attempt.max(1);
        self
    }
}

#[async_trait]
impl LocateMode for DomAnalysisMode {
    fn name(&self) -> &str {
        "dom_analysis"
    }

    async fn process_request(
        &self,
        request: &str,
        plugin: &mut dyn Plugin,
        llm: &dyn LlmClient,
        reranker: &dyn RerankerClient,
        completion: &mut LocatrCompletion,
    ) -> Result<(), LocateError> {
        let _topic = Topic::start("[Mode] DOM Analysis");

        let dom = plugin.get_minified_dom().await?;
        let top_n = self.max_attempts * self.chunks_per_attempt;
        let chunks = ranked_chunks(request, &dom, &self.splitter, top_n, reranker).await?;

        for (attempt, batch) in chunks
            .chunks(self.chunks_per_attempt)
            .take(self.max_attempts)
            .enumerate()
        {
            info!("Attempt number {}", attempt + 1);

            let prompt = dom_analysis_prompt(&batch.join("\n"), request);
            let answer = match llm.get_json_completion(&prompt, None).await {
                Ok(answer) => answer,
                Err(e) => {
                    warn!("Couldn't get JSON completion: {}", e);
                    continue;
                }
            };
            completion.add_usage(&answer);

            let output: DomAnalysisOutput = match parse_llm_json(&answer.json) {
                Ok(output) => output,
                Err(e) => {
                    warn!("Failed to parse model output: {}", e);
                    continue;
                }
            };
            if let Some(error) = output.error.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
                warn!("Model reported an error: {}", error);
                continue;
            }
            let element_id = output.element_id.as_deref().map(str::trim);
            let Some(id) = element_id.filter(|id| !id.is_empty()) else {
                warn!("No relevant element ID in model output");
                continue;
            };
            let Some(locators) = dom.locators(id) else {
                warn!(element_id = %id, "No locators associated with element ID");
                continue;
            };

            completion.locators = locators.to_vec();
            completion.locator_type = Some(dom.metadata.locator_type);
            return Ok(());
        }

        Err(LocateError::NoElementId {
            usage: completion.meta.clone(),
        })
    }
}

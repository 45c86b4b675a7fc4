use super::{LocateMode, parse_llm_json, ranked_chunks};
use crate::error::LocateError;
use crate::logging::Topic;
use async_trait::async_trait;
use locatr_common::{
    LlmClient, Location, LocatrCompletion, Plugin, PluginError, Point, RerankerClient, Resolution,
};
use locatr_dom::HtmlSplitter;
use serde::Deserialize;
use tracing::{info, warn};

pub const DEFAULT_MAX_ATTEMPTS: usize = 10;

pub fn visual_analysis_prompt(resolution: Resolution, request: &str) -> String {
    format!(
        r#"Your task is to identify the exact (X, Y) coordinates for a described element or area on a screenshot of a web page with a resolution of {width} x {height}.

Analyze the screenshot and the user's request carefully to determine the appropriate coordinates. The coordinates should point to the center of the described element when possible.

Guidelines for coordinate identification:
1. For buttons, links, and clickable elements: Target the center of the element
2. For text fields: Target the beginning of the input area
3. For larger areas: Target the most relevant point that satisfies the user's intent

If you cannot confidently determine the coordinates based on the provided information, return an empty string for the point and provide a helpful error message explaining why.

Provide your response in valid JSON format with the following structure:
{{
    "element_point": "x, y",  // Comma-separated X and Y coordinates, or empty string if coordinates cannot be determined
    "error": ""       // A descriptive error message if coordinates cannot be determined, otherwise an empty string
}}

User request: {request}
Be precise in your coordinate estimation as these will be used for automated interactions.
"#,
        width = resolution.width,
        height = resolution.height,
    )
}

/// Parse `"x, y"`. Anything other than two finite numbers is rejected.
pub fn parse_point(raw: &str) -> Option<Point> {
    let (x, y) = raw.split_once(',')?;
    if y.contains(',') {
        return None;
    }
    let x: f64 = x.trim().parse().ok()?;
    let y: f64 = y.trim().parse().ok()?;
    (x.is_finite() && y.is_finite()).then(|| Point::new(x, y))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VisualAnalysisOutput {
    element_point: Option<String>,
    error: Option<String>,
}

/// Screenshot strategy: each ranked chunk anchors a viewport, the model
/// points at the element, and the plugin maps the point back to locators.
#[derive(Debug, Clone)]
pub struct VisualAnalysisMode {
    splitter: HtmlSplitter,
    max_attempts: usize,
    resolution: Resolution,
}

impl Default for VisualAnalysisMode {
    fn default() -> Self {
        Self {
            splitter: HtmlSplitter::default(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            resolution: Resolution::default(),
        }
    }
}

impl VisualAnalysisMode {
    pub fn with_splitter(mut self, splitter: HtmlSplitter) -> Self {
        self.splitter = splitter;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Per-attempt plugin failures are logged and skipped, except for missing
/// capabilities, which no later attempt can recover from.
fn soft<T>(step: &str, result: Result<T, PluginError>) -> Result<Option<T>, LocateError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e @ PluginError::NotSupported(_)) => Err(e.into()),
        Err(e) => {
            warn!("Couldn't {}: {}", step, e);
            Ok(None)
        }
    }
}

#[async_trait]
impl LocateMode for VisualAnalysisMode {
    fn name(&self) -> &str {
        "visual_analysis"
    }

    async fn process_request(
        &self,
        request: &str,
        plugin: &mut dyn Plugin,
        llm: &dyn LlmClient,
        reranker: &dyn RerankerClient,
        completion: &mut LocatrCompletion,
    ) -> Result<(), LocateError> {
        let _topic = Topic::start("[Mode] Visual Analysis");

        let dom = plugin.get_minified_dom().await?;
        let chunks =
            ranked_chunks(request, &dom, &self.splitter, self.max_attempts, reranker).await?;
        let prompt = visual_analysis_prompt(self.resolution, request);

        for (attempt, chunk) in chunks.iter().enumerate() {
            info!("Attempt number {}", attempt + 1);

            let id = plugin.extract_first_unique_id(chunk).await;
            let Some(id) = soft("extract element id", id)? else {
                continue;
            };
            let Some(locator) = dom.locators(&id).and_then(|l| l.first()) else {
                warn!(element_id = %id, "No locators associated with chunk element");
                continue;
            };
            let viewport = plugin
                .set_viewport_size(self.resolution.width, self.resolution.height)
                .await;
            if soft("set viewport size", viewport)?.is_none() {
                continue;
            }
            let anchor = plugin.get_element_location(locator).await;
            let Some(anchor) = soft("find chunk on the page", anchor)? else {
                continue;
            };
            let Some(screenshot) = soft("take screenshot", plugin.take_screenshot().await)? else {
                continue;
            };

            let answer = match llm.get_json_completion(&prompt, Some(&screenshot)).await {
                Ok(answer) => answer,
                Err(e) => {
                    warn!("Couldn't get JSON completion: {}", e);
                    continue;
                }
            };
            completion.add_usage(&answer);

            let output: VisualAnalysisOutput = match parse_llm_json(&answer.json) {
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
            let raw_point = output.element_point.unwrap_or_default();
            let Some(point) = parse_point(&raw_point) else {
                warn!("Invalid point '{}', expected format: x,y", raw_point);
                continue;
            };
            info!("Element point {}", point);

            let location = Location {
                point,
                scroll_position: anchor.scroll_position,
            };
            let locators = plugin.get_element_locators(&location).await;
            let Some(locators) = soft("get element locators", locators)? else {
                continue;
            };
            if locators.is_empty() {
                warn!("No element found at {}", point);
                continue;
            }

            completion.locators = locators;
            completion.locator_type = Some(dom.metadata.locator_type);
            return Ok(());
        }

        Err(LocateError::NoElementPoint {
            usage: completion.meta.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_parsing() {
        assert_eq!(parse_point("10, 20.5"), Some(Point::new(10.0, 20.5)));
        assert_eq!(parse_point(" 3,4 "), Some(Point::new(3.0, 4.0)));
        assert_eq!(parse_point(""), None);
        assert_eq!(parse_point("1,2,3"), None);
        assert_eq!(parse_point("x, 2"), None);
        assert_eq!(parse_point("NaN, 2"), None);
    }
}

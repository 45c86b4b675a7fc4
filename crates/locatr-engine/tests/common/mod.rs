#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use locatr_common::{
    ClientError, JsonCompletion, LlmClient, RerankRequest, RerankResult, RerankerClient,
};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const LOGIN_PAGE: &str = r#"<hierarchy><button id="b1">Login</button></hierarchy>"#;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// LLM that replays scripted JSON answers in order, then fails.
#[derive(Debug, Default)]
pub struct MockLlm {
    responses: Mutex<VecDeque<String>>,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
    pub images: Mutex<Vec<Option<Vec<u8>>>>,
}

impl MockLlm {
    pub fn new<S: Into<String>>(responses: impl IntoIterator<Item = S>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    /// Answers every call with the same JSON.
    pub fn repeating(response: &str, times: usize) -> Self {
        Self::new(std::iter::repeat_n(response, times))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn get_json_completion(
        &self,
        prompt: &str,
        image: Option<&[u8]>,
    ) -> Result<JsonCompletion, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.images.lock().unwrap().push(image.map(<[u8]>::to_vec));

        let json = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ClientError::Request("no scripted response left".into()))?;
        Ok(JsonCompletion {
            json,
            input_tokens: 100,
            output_tokens: 10,
        })
    }
}

/// Reranker that keeps the document order unless told otherwise.
#[derive(Debug, Default)]
pub struct MockReranker {
    scripted: Option<Vec<RerankResult>>,
    pub calls: AtomicUsize,
    pub requests: Mutex<Vec<RerankRequest>>,
}

impl MockReranker {
    pub fn with_results(results: Vec<RerankResult>) -> Self {
        Self {
            scripted: Some(results),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RerankerClient for MockReranker {
    async fn rerank(&self, request: RerankRequest) -> Result<Vec<RerankResult>, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let results = match &self.scripted {
            Some(results) => results.clone(),
            None => (0..request.documents.len())
                .map(|index| RerankResult {
                    index,
                    score: 1.0 / (index as f64 + 1.0),
                })
                .collect(),
        };
        self.requests.lock().unwrap().push(request);
        Ok(results)
    }
}

pub fn element_id_answer(id: &str) -> String {
    format!(r#"{{"element_id": "{}", "error": ""}}"#, id)
}

/// Solid grey PNG of the given size.
pub fn png(width: u32, height: u32) -> Vec<u8> {
    let pixels = RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255]));
    let img = DynamicImage::ImageRgba8(pixels);
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// `<hierarchy>` holding `count` text-bearing `div`s with ids `d0..`.
pub fn list_page(count: usize) -> String {
    let mut source = String::from("<hierarchy>");
    for i in 0..count {
        source.push_str(&format!(r#"<div id="d{i}">Item {i}</div>"#));
    }
    source.push_str("</hierarchy>");
    source
}

//! Generative model providers.
//!
//! A [`ModelProvider`] is an immutable capability shared across requests: all per-request state
//! lives in the stream it returns. [`GeminiClient`] talks to the Gemini streaming endpoint over
//! Server-Sent Events.

use crate::constants::{DEFAULT_MODEL, GEMINI_API_BASE};
use crate::error::{FailureKind, GenerationFailure};
use crate::sse::{SseDecoder, SseFrame};
use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::pin::Pin;

/// Text deltas produced by a model, in order. A failure item ends the stream.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, GenerationFailure>> + Send>>;

#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Starts a streaming generation for `prompt`.
    async fn stream_generate(&self, prompt: &str) -> Result<TokenStream, GenerationFailure>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    error: Option<ApiError>,
}

const BLOCKING_FINISH_REASONS: [&str; 5] = [
    "SAFETY",
    "BLOCKLIST",
    "PROHIBITED_CONTENT",
    "SPII",
    "RECITATION",
];

impl ApiError {
    fn into_failure(self) -> GenerationFailure {
        let mut message = String::new();
        if let Some(code) = self.code {
            message.push_str(&format!("{} ", code));
        }
        if let Some(status) = self.status {
            message.push_str(&format!("{}: ", status));
        }
        message.push_str(self.message.as_deref().unwrap_or("provider error"));
        GenerationFailure::classify(message)
    }
}

/// Decodes one Gemini SSE `data:` payload into its text delta.
///
/// Returns `Ok(None)` for frames that carry no text (usage metadata, empty parts).
fn parse_gemini_chunk(data: &str) -> Result<Option<String>, GenerationFailure> {
    let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
        GenerationFailure::new(
            FailureKind::Generation,
            format!("malformed provider frame: {}", e),
        )
    })?;

    if let Some(error) = chunk.error {
        return Err(error.into_failure());
    }
    if let Some(reason) = chunk.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(GenerationFailure::new(
            FailureKind::ContentFiltered,
            format!("Prompt was blocked: {}", reason),
        ));
    }

    let Some(candidate) = chunk.candidates.into_iter().next() else {
        return Ok(None);
    };
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if let Some(reason) = candidate.finish_reason.as_deref() {
        if BLOCKING_FINISH_REASONS.contains(&reason) {
            return Err(GenerationFailure::new(
                FailureKind::ContentFiltered,
                format!("Response was blocked: {}", reason),
            ));
        }
    }

    Ok((!text.is_empty()).then_some(text))
}

/// Classifies a non-success HTTP response from the provider.
fn classify_http_failure(status: u16, body: &str) -> GenerationFailure {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .and_then(|e| e.error)
        .and_then(|e| e.message)
        .unwrap_or_else(|| body.trim().to_owned());

    match status {
        401 | 403 => GenerationFailure::new(FailureKind::InvalidApiKey, detail),
        _ => GenerationFailure::classify(format!("HTTP {}: {}", status, detail)),
    }
}

struct FrameState<S> {
    bytes: Pin<Box<S>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, GenerationFailure>>,
    done: bool,
}

impl<S> FrameState<S> {
    fn enqueue(&mut self, frame: SseFrame) {
        if self.done || frame.data.is_empty() || frame.data == "[DONE]" {
            return;
        }
        match parse_gemini_chunk(&frame.data) {
            Ok(Some(text)) => self.pending.push_back(Ok(text)),
            Ok(None) => {}
            Err(failure) => {
                self.pending.push_back(Err(failure));
                self.done = true;
            }
        }
    }
}

/// Turns a raw SSE byte stream from the Gemini endpoint into a [`TokenStream`].
fn token_stream<S, B, E>(bytes: S) -> TokenStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]>,
    E: std::fmt::Display,
{
    let state = FrameState {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        done: false,
    };

    Box::pin(futures_util::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.done {
                return None;
            }
            match st.bytes.next().await {
                Some(Ok(chunk)) => {
                    for frame in st.decoder.push(chunk.as_ref()) {
                        st.enqueue(frame);
                    }
                }
                Some(Err(e)) => {
                    st.pending
                        .push_back(Err(GenerationFailure::classify(e.to_string())));
                    st.done = true;
                }
                None => {
                    if let Some(frame) = st.decoder.finish() {
                        st.enqueue(frame);
                    }
                    st.done = true;
                }
            }
        }
    }))
}

/// Gemini streaming client.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_owned()),
            base_url: GEMINI_API_BASE.to_owned(),
        }
    }

    /// Points the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ModelProvider for GeminiClient {
    async fn stream_generate(&self, prompt: &str) -> Result<TokenStream, GenerationFailure> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig::default(),
        };

        let resp = self
            .http
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationFailure::classify(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            tracing::warn!("gemini returned HTTP {}", status);
            return Err(classify_http_failure(status.as_u16(), &text));
        }

        Ok(token_stream(resp.bytes_stream()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

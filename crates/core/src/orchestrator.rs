//! Streaming generation orchestrator.
//!
//! One generation request moves through `Idle → Streaming → {Completing, Failing} → Closed`.
//! [`StreamState`] is the synchronous state machine: it turns provider tokens into protocol
//! events. [`Orchestrator`] is the async driver: it pulls tokens from a [`ModelProvider`], pushes
//! events into a bounded channel and stops as soon as the receiving side goes away.
//!
//! Slides are emitted mid-stream. The raw token text is fed to a [`JsonExtractor`], which only
//! surfaces top-level values, and in parallel through a [`SlideFramer`] that forwards the elements
//! of the deck's `slides` array to a second extractor. Candidates from both are validated on their
//! own and emitted at most once per slide id.

use crate::constants::EVENT_CHANNEL_CAPACITY;
use crate::error::{ErrorPayload, FailureKind, GenerationFailure};
use crate::extractor::{JsonExtractor, Lexeme, Lexer};
use crate::prompt::build_presentation_prompt;
use crate::provider::ModelProvider;
use crate::validation::{is_slide_shaped, validate_presentation, validate_slide, GenerationRequest};
use deck_types::{PresentationResponse, Slide};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::Instrument;

/// One protocol event, serialised as `{"type": <name>, "data": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamEvent {
    /// Raw text delta from the model.
    Chunk(String),
    /// A slide that passed validation on its own.
    Slide(Slide),
    /// End of stream. `None` when the full deck failed to parse or validate.
    Complete(Option<PresentationResponse>),
    Error(ErrorPayload),
}

impl StreamEvent {
    /// SSE `event:` name.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Chunk(_) => "chunk",
            StreamEvent::Slide(_) => "slide",
            StreamEvent::Complete(_) => "complete",
            StreamEvent::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, StreamEvent::Complete(_) | StreamEvent::Error(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Streaming,
    Completing,
    Failing,
    Closed,
}

/// How a driven stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// A `complete` event was delivered.
    Completed,
    /// An `error` event was delivered.
    Failed(FailureKind),
    /// The receiver went away before a terminal event was delivered.
    Cancelled,
}

/// Forwards the elements of a deck's slide array, one after another, without separators.
///
/// The root value is the first `{` or `[` in the text. For a root object the array is the value
/// of its top-level `"slides"` key; a root array is taken to be the slide array itself. Text before
/// the root is ignored, and once the root closes the framer waits for the next one.
#[derive(Debug, Default)]
pub(crate) struct SlideFramer {
    lexer: Lexer,
    root_started: bool,
    /// Nesting depth of the slide array once it has been entered.
    array_depth: Option<i64>,
    key: Option<String>,
    last_key: String,
}

impl SlideFramer {
    pub(crate) fn feed(&mut self, chunk: &str) -> String {
        let mut out = String::new();

        for ch in chunk.chars() {
            if !self.root_started {
                match ch {
                    '{' => self.root_started = true,
                    '[' => {
                        self.root_started = true;
                        self.array_depth = Some(1);
                    }
                    _ => continue,
                }
            }

            let before = self.lexer.depth();
            let mut utf8 = [0u8; 4];
            let mut lexeme = Lexeme::Other;
            for (i, byte) in ch.encode_utf8(&mut utf8).bytes().enumerate() {
                let step = self.lexer.step(byte);
                if i == 0 {
                    lexeme = step;
                }
            }
            let after = self.lexer.depth();

            match self.array_depth {
                Some(depth) if before > depth || after > depth => out.push(ch),
                Some(depth) if after < depth => self.array_depth = None,
                Some(_) => {}
                None => self.track_key(ch, lexeme, before, after),
            }

            if after <= 0 {
                *self = Self::default();
            }
        }

        out
    }

    fn track_key(&mut self, ch: char, lexeme: Lexeme, before: i64, after: i64) {
        match lexeme {
            Lexeme::StringStart if before == 1 => self.key = Some(String::new()),
            Lexeme::StringByte => {
                if let Some(key) = self.key.as_mut() {
                    key.push(ch);
                }
            }
            Lexeme::StringEnd => {
                if let Some(key) = self.key.take() {
                    self.last_key = key;
                }
            }
            Lexeme::Open if ch == '[' && before == 1 && after == 2 && self.last_key == "slides" => {
                self.array_depth = Some(2);
            }
            _ => {}
        }
    }
}

/// Per-request generation state. Never shared between requests.
#[derive(Debug)]
pub struct StreamState {
    expected_slides: usize,
    budget: Duration,
    started: Option<Instant>,
    phase: StreamPhase,
    accumulated: String,
    extractor: JsonExtractor,
    framer: SlideFramer,
    slide_extractor: JsonExtractor,
    emitted: HashSet<String>,
    failure: Option<FailureKind>,
}

impl StreamState {
    pub fn new(expected_slides: usize, budget: Duration) -> Self {
        Self {
            expected_slides,
            budget,
            started: None,
            phase: StreamPhase::Idle,
            accumulated: String::new(),
            extractor: JsonExtractor::new(),
            framer: SlideFramer::default(),
            slide_extractor: JsonExtractor::discarding(),
            emitted: HashSet::new(),
            failure: None,
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// Full model output received so far.
    pub fn accumulated(&self) -> &str {
        &self.accumulated
    }

    pub fn slides_emitted(&self) -> usize {
        self.emitted.len()
    }

    /// Kind of the failure that ended the stream, if any.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure
    }

    pub fn begin(&mut self, now: Instant) {
        if self.phase == StreamPhase::Idle {
            self.started = Some(now);
            self.phase = StreamPhase::Streaming;
        }
    }

    /// Handles one text delta received at `now`.
    pub fn on_token(&mut self, token: &str, now: Instant) -> Vec<StreamEvent> {
        if self.phase != StreamPhase::Streaming {
            return Vec::new();
        }

        let elapsed = self.started.map(|s| now.duration_since(s)).unwrap_or_default();
        if elapsed > self.budget {
            return self.on_timeout();
        }

        self.accumulated.push_str(token);
        let mut events = vec![StreamEvent::Chunk(token.to_owned())];

        let mut candidates = self.extractor.feed(token);
        let framed = self.framer.feed(token);
        if !framed.is_empty() {
            candidates.extend(self.slide_extractor.feed(&framed));
        }

        for candidate in candidates {
            if let Some(slide) = self.accept(candidate) {
                events.push(StreamEvent::Slide(slide));
            }
        }
        events
    }

    /// Handles the normal end of the provider stream.
    pub fn on_end(&mut self) -> Vec<StreamEvent> {
        if self.phase != StreamPhase::Streaming {
            return Vec::new();
        }
        self.phase = StreamPhase::Completing;
        vec![StreamEvent::Complete(self.final_presentation())]
    }

    /// Handles a provider fault.
    pub fn on_failure(&mut self, failure: GenerationFailure) -> Vec<StreamEvent> {
        if self.phase != StreamPhase::Streaming {
            return Vec::new();
        }
        tracing::warn!(code = failure.code(), "generation failed: {}", failure.message);
        self.phase = StreamPhase::Failing;
        self.failure = Some(failure.kind);
        vec![StreamEvent::Error(failure.payload())]
    }

    pub fn on_timeout(&mut self) -> Vec<StreamEvent> {
        self.on_failure(GenerationFailure::timeout(self.budget))
    }

    pub fn close(&mut self) {
        self.phase = StreamPhase::Closed;
    }

    fn accept(&mut self, candidate: Value) -> Option<Slide> {
        if self.emitted.len() >= self.expected_slides || !is_slide_shaped(&candidate) {
            return None;
        }
        let slide = match validate_slide(&candidate) {
            Ok(slide) => slide,
            Err(e) => {
                tracing::debug!("discarding slide candidate: {}", e);
                return None;
            }
        };
        if !self.emitted.insert(slide.id.clone()) {
            tracing::debug!("discarding duplicate slide {}", slide.id);
            return None;
        }
        Some(slide)
    }

    fn final_presentation(&self) -> Option<PresentationResponse> {
        let text = strip_code_fences(&self.accumulated);
        let Some(value) = parse_lenient(text) else {
            tracing::warn!("model output is not valid JSON; completing without a presentation");
            return None;
        };

        match validate_presentation(&value, self.expected_slides) {
            Ok(presentation) => Some(presentation),
            Err(e) => {
                tracing::warn!(code = e.code(), "final presentation rejected: {}", e);
                None
            }
        }
    }
}

/// Removes a surrounding Markdown code fence (with optional language tag) and trims.
pub fn strip_code_fences(text: &str) -> &str {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.find('\n') {
            Some(newline) => &rest[newline + 1..],
            None => rest,
        };
    }
    if let Some(rest) = text.trim_end().strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

fn parse_lenient(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

/// Drives generations against a shared provider.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn ModelProvider>,
    budget: Duration,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn ModelProvider>, budget: Duration) -> Self {
        Self { provider, budget }
    }

    /// Spawns a generation and returns the receiving end of its event channel.
    ///
    /// Dropping the receiver cancels the generation.
    pub fn start(&self, request: GenerationRequest) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let this = self.clone();
        tokio::spawn(async move {
            this.run(request, tx).await;
        });
        rx
    }

    /// Runs one generation to completion, failure or cancellation, sending events to `events`.
    pub async fn run(
        &self,
        request: GenerationRequest,
        events: mpsc::Sender<StreamEvent>,
    ) -> StreamOutcome {
        let span = tracing::info_span!(
            "generation",
            request_id = %uuid::Uuid::new_v4(),
            num_slides = request.num_slides()
        );
        self.drive(request, events).instrument(span).await
    }

    async fn drive(
        &self,
        request: GenerationRequest,
        events: mpsc::Sender<StreamEvent>,
    ) -> StreamOutcome {
        let mut state = StreamState::new(request.num_slides(), self.budget);
        let started = Instant::now();
        state.begin(started);
        tracing::info!(model = self.provider.model(), "starting generation");

        let deadline = tokio::time::sleep_until(started + self.budget);
        tokio::pin!(deadline);

        let prompt = build_presentation_prompt(request.prompt(), request.num_slides());
        let opened = tokio::select! {
            _ = events.closed() => {
                tracing::info!("client disconnected before the model responded");
                state.close();
                return StreamOutcome::Cancelled;
            }
            _ = &mut deadline => Err(GenerationFailure::timeout(self.budget)),
            result = self.provider.stream_generate(&prompt) => result,
        };

        let mut tokens = match opened {
            Ok(tokens) => tokens,
            Err(failure) => {
                let kind = failure.kind;
                let out = state.on_failure(failure);
                return finish(&mut state, &events, out, StreamOutcome::Failed(kind)).await;
            }
        };

        loop {
            let out = tokio::select! {
                _ = events.closed() => {
                    tracing::info!("client disconnected; dropping upstream stream");
                    state.close();
                    return StreamOutcome::Cancelled;
                }
                _ = &mut deadline => state.on_timeout(),
                item = tokens.next() => match item {
                    Some(Ok(token)) => state.on_token(&token, Instant::now()),
                    Some(Err(failure)) => state.on_failure(failure),
                    None => state.on_end(),
                },
            };

            match state.phase() {
                StreamPhase::Streaming => {
                    if !deliver(&events, out).await {
                        tracing::info!("client disconnected; dropping upstream stream");
                        state.close();
                        return StreamOutcome::Cancelled;
                    }
                }
                StreamPhase::Completing => {
                    tracing::info!(slides = state.slides_emitted(), "generation complete");
                    return finish(&mut state, &events, out, StreamOutcome::Completed).await;
                }
                _ => {
                    let kind = state.failure_kind().unwrap_or(FailureKind::Generation);
                    return finish(&mut state, &events, out, StreamOutcome::Failed(kind)).await;
                }
            }
        }
    }
}

async fn deliver(events: &mpsc::Sender<StreamEvent>, out: Vec<StreamEvent>) -> bool {
    for event in out {
        if events.send(event).await.is_err() {
            return false;
        }
    }
    true
}

async fn finish(
    state: &mut StreamState,
    events: &mpsc::Sender<StreamEvent>,
    out: Vec<StreamEvent>,
    outcome: StreamOutcome,
) -> StreamOutcome {
    let delivered = deliver(events, out).await;
    state.close();
    if delivered {
        outcome
    } else {
        StreamOutcome::Cancelled
    }
}

//! Client-side reassembly of a generation event stream.

use crate::error::ErrorPayload;
use crate::orchestrator::StreamEvent;
use crate::sse::SseFrame;
use deck_types::{PresentationResponse, Slide};

const CHUNK_PROGRESS: u8 = 5;
const SLIDE_PROGRESS: u8 = 10;
const STREAMING_PROGRESS_CAP: u8 = 90;

/// Decodes one SSE `data:` payload. Unparseable payloads are skipped.
pub fn parse_event_data(data: &str) -> Option<StreamEvent> {
    match serde_json::from_str(data) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!("skipping unparseable event payload: {}", e);
            None
        }
    }
}

/// Folds protocol events into the state a client renders.
#[derive(Debug, Default, Clone)]
pub struct DeckAssembler {
    slides: Vec<Slide>,
    text: String,
    progress: u8,
    finished: bool,
    error: Option<ErrorPayload>,
    presentation: Option<PresentationResponse>,
}

impl DeckAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies one event. Events after a terminal event are ignored.
    pub fn apply(&mut self, event: StreamEvent) {
        if self.finished {
            return;
        }
        match event {
            StreamEvent::Chunk(text) => {
                self.text.push_str(&text);
                self.bump(CHUNK_PROGRESS);
            }
            StreamEvent::Slide(slide) => {
                self.slides.push(slide);
                self.bump(SLIDE_PROGRESS);
            }
            StreamEvent::Complete(presentation) => {
                self.presentation = presentation;
                self.progress = 100;
                self.finished = true;
            }
            StreamEvent::Error(payload) => {
                self.error = Some(payload);
                self.finished = true;
            }
        }
    }

    /// Applies a decoded SSE frame, returning `true` if it carried a protocol event.
    pub fn apply_frame(&mut self, frame: &SseFrame) -> bool {
        match parse_event_data(&frame.data) {
            Some(event) => {
                self.apply(event);
                true
            }
            None => false,
        }
    }

    fn bump(&mut self, by: u8) {
        self.progress = self.progress.saturating_add(by).min(STREAMING_PROGRESS_CAP);
    }

    /// Slides received as `slide` events, in arrival order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    /// Model text received so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn error(&self) -> Option<&ErrorPayload> {
        self.error.as_ref()
    }

    /// The validated deck from the `complete` event, when the server produced one.
    pub fn presentation(&self) -> Option<&PresentationResponse> {
        self.presentation.as_ref()
    }

    /// Canonical slides: the validated deck's when present, otherwise the streamed ones.
    pub fn final_slides(&self) -> &[Slide] {
        match &self.presentation {
            Some(presentation) => &presentation.slides,
            None => &self.slides,
        }
    }
}

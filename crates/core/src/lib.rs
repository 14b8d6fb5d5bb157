//! # deckstream core
//!
//! Core logic for streaming slide-deck generation.
//!
//! This crate turns a token stream from a generative model into validated, typed deck events:
//! - Incremental JSON extraction over fragmented text ([`extractor`])
//! - Schema validation of slides and decks ([`validation`])
//! - Classification of provider failures ([`error`])
//! - The per-request streaming state machine and its async driver ([`orchestrator`])
//! - Brand palette extraction from logos ([`palette`])
//!
//! **No API concerns**: HTTP routing, SSE framing of responses and DTOs belong in `api-rest` and
//! `api-shared`.

pub mod config;
pub mod constants;
pub mod consumer;
pub mod error;
pub mod export;
pub mod extractor;
pub mod images;
pub mod orchestrator;
pub mod palette;
pub mod prompt;
pub mod provider;
pub mod speaker_notes;
pub mod sse;
pub mod templates;
pub mod validation;

pub use config::CoreConfig;
pub use consumer::DeckAssembler;
pub use error::{classify_failure, ErrorPayload, FailureKind, GenerationFailure};
pub use export::{DeckExporter, ExportFailure, ExportRequest, ExportedDeck};
pub use extractor::JsonExtractor;
pub use images::{ImageResult, ImageSearch, UnsplashClient};
pub use orchestrator::{Orchestrator, StreamEvent, StreamOutcome, StreamPhase, StreamState};
pub use palette::PaletteError;
pub use provider::{GeminiClient, ModelProvider, TokenStream};
pub use validation::{GenerationRequest, ValidationError};

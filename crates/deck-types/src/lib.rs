//! Shared domain types for deckstream.
//!
//! These are the wire-facing shapes of a generated deck: slides and their speaker notes, the
//! assembled presentation, brand colours and slide templates. They carry no validation logic of
//! their own; `deckstream-core` only constructs them from model output after schema validation.

pub mod color;
pub mod slide;
pub mod template;

pub use color::{BrandColors, ColorError, Rgb};
pub use slide::{PresentationResponse, Slide, SlideKind, SpeakerNotes};
pub use template::{LayoutKind, Template, TemplateColors, TemplateFonts};

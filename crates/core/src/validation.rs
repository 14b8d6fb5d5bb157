//! Schema validation for generated decks and inbound generation requests.
//!
//! Model output is first deserialised into the `deck-types` shapes (reporting the JSON path of
//! any structural mismatch) and then checked against the field bounds in
//! [`crate::constants`]. Validation never mutates its input.

use crate::constants::{
    BULLET_CHARS, BULLET_COUNT, IMAGE_PROMPT_CHARS, KEY_POINT_CHARS, KEY_POINT_COUNT, NUM_SLIDES,
    PRESENTATION_SUBTITLE_CHARS, PRESENTATION_TITLE_CHARS, PROMPT_CHARS, SCRIPT_CHARS,
    SLIDE_ID_PREFIX, SLIDE_TITLE_CHARS, TIP_CHARS, TIP_COUNT,
};
use crate::error::codes;
use crate::speaker_notes::SpeakingDuration;
use deck_types::{PresentationResponse, Slide, SlideKind, SpeakerNotes};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ops::RangeInclusive;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The value does not have the expected structure (missing field, wrong type, bad enum).
    #[error("invalid structure at '{path}': {message}")]
    Shape { path: String, message: String },

    /// A field is present but violates a length, count or pattern constraint.
    #[error("{field}: {message}")]
    Constraint { field: String, message: String },

    /// Well-formed deck with the wrong number of slides.
    #[error("expected {expected} slides, got {actual}")]
    SlideCountMismatch { expected: usize, actual: usize },

    /// Slides are not ordered title, content..., conclusion.
    #[error("slide {index} must be of type '{expected}' but is '{actual}'")]
    TypeSequence {
        index: usize,
        expected: SlideKind,
        actual: SlideKind,
    },

    /// The inbound generation request is malformed.
    #[error("invalid request: {0}")]
    Request(String),
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::SlideCountMismatch { .. } => codes::SLIDE_COUNT_MISMATCH,
            _ => codes::VALIDATION_ERROR,
        }
    }

    /// `true` when the JSON was well-formed but the model ignored its instructions.
    pub fn is_generation_failure(&self) -> bool {
        matches!(self, ValidationError::SlideCountMismatch { .. })
    }
}

pub type ValidationResult<T> = std::result::Result<T, ValidationError>;

/// A generation request whose fields have been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    prompt: String,
    num_slides: usize,
}

impl GenerationRequest {
    /// Validates a raw prompt and requested slide count.
    ///
    /// The prompt is trimmed before its length is checked.
    pub fn new(prompt: &str, num_slides: i64) -> ValidationResult<Self> {
        let prompt = prompt.trim();
        let len = prompt.chars().count();
        if !PROMPT_CHARS.contains(&len) {
            return Err(ValidationError::Request(format!(
                "prompt must be between {} and {} characters (got {})",
                PROMPT_CHARS.start(),
                PROMPT_CHARS.end(),
                len
            )));
        }

        let num_slides = usize::try_from(num_slides)
            .ok()
            .filter(|n| NUM_SLIDES.contains(n))
            .ok_or_else(|| {
                ValidationError::Request(format!(
                    "numSlides must be between {} and {} (got {})",
                    NUM_SLIDES.start(),
                    NUM_SLIDES.end(),
                    num_slides
                ))
            })?;

        Ok(Self {
            prompt: prompt.to_owned(),
            num_slides,
        })
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn num_slides(&self) -> usize {
        self.num_slides
    }
}

/// Validates a complete deck and checks it has exactly `expected_slides` slides in
/// title/content/conclusion order.
pub fn validate_presentation(
    value: &Value,
    expected_slides: usize,
) -> ValidationResult<PresentationResponse> {
    let presentation: PresentationResponse = deserialize(value)?;

    check_chars("title", &presentation.title, &PRESENTATION_TITLE_CHARS)?;
    check_chars("subtitle", &presentation.subtitle, &PRESENTATION_SUBTITLE_CHARS)?;
    for (index, slide) in presentation.slides.iter().enumerate() {
        check_slide(&format!("slides[{}].", index), slide)?;
    }

    let actual = presentation.slides.len();
    if actual != expected_slides {
        return Err(ValidationError::SlideCountMismatch {
            expected: expected_slides,
            actual,
        });
    }

    for (index, slide) in presentation.slides.iter().enumerate() {
        let expected = SlideKind::expected_at(index, actual);
        if slide.kind != expected {
            return Err(ValidationError::TypeSequence {
                index,
                expected,
                actual: slide.kind,
            });
        }
    }

    Ok(presentation)
}

/// Validates a single slide in isolation.
pub fn validate_slide(value: &Value) -> ValidationResult<Slide> {
    let slide: Slide = deserialize(value)?;
    check_slide("", &slide)?;
    Ok(slide)
}

/// Cheap pre-filter: an object exposing both `id` and `type`.
pub fn is_slide_shaped(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|obj| obj.contains_key("id") && obj.contains_key("type"))
}

fn deserialize<T: DeserializeOwned>(value: &Value) -> ValidationResult<T> {
    serde_path_to_error::deserialize(value).map_err(|err| {
        let path = err.path().to_string();
        ValidationError::Shape {
            path,
            message: err.into_inner().to_string(),
        }
    })
}

fn check_slide(prefix: &str, slide: &Slide) -> ValidationResult<()> {
    let field = |name: &str| format!("{}{}", prefix, name);

    let numbered = slide
        .id
        .strip_prefix(SLIDE_ID_PREFIX)
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()));
    if !numbered {
        return Err(ValidationError::Constraint {
            field: field("id"),
            message: format!("must match '{}<number>' (got '{}')", SLIDE_ID_PREFIX, slide.id),
        });
    }

    check_chars(&field("title"), &slide.title, &SLIDE_TITLE_CHARS)?;
    check_items(&field("bullets"), &slide.bullets, &BULLET_COUNT, &BULLET_CHARS)?;
    check_chars(&field("imagePrompt"), &slide.image_prompt, &IMAGE_PROMPT_CHARS)?;
    check_speaker_notes(&field("speakerNotes."), &slide.speaker_notes)
}

fn check_speaker_notes(prefix: &str, notes: &SpeakerNotes) -> ValidationResult<()> {
    let field = |name: &str| format!("{}{}", prefix, name);

    check_chars(&field("script"), &notes.script, &SCRIPT_CHARS)?;
    SpeakingDuration::parse(&notes.duration).map_err(|e| ValidationError::Constraint {
        field: field("duration"),
        message: e.to_string(),
    })?;
    check_items(&field("tips"), &notes.tips, &TIP_COUNT, &TIP_CHARS)?;
    check_items(
        &field("keyPoints"),
        &notes.key_points,
        &KEY_POINT_COUNT,
        &KEY_POINT_CHARS,
    )
}

fn check_chars(field: &str, value: &str, bounds: &RangeInclusive<usize>) -> ValidationResult<()> {
    let len = value.chars().count();
    if bounds.contains(&len) {
        Ok(())
    } else {
        Err(ValidationError::Constraint {
            field: field.to_owned(),
            message: format!(
                "must be {}-{} characters (got {})",
                bounds.start(),
                bounds.end(),
                len
            ),
        })
    }
}

fn check_items(
    field: &str,
    items: &[String],
    count: &RangeInclusive<usize>,
    chars: &RangeInclusive<usize>,
) -> ValidationResult<()> {
    if !count.contains(&items.len()) {
        return Err(ValidationError::Constraint {
            field: field.to_owned(),
            message: format!(
                "must have {}-{} entries (got {})",
                count.start(),
                count.end(),
                items.len()
            ),
        });
    }

    for (index, item) in items.iter().enumerate() {
        check_chars(&format!("{}[{}]", field, index), item, chars)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub(crate) fn slide_json(index: usize, kind: &str) -> Value {
        json!({
            "id": format!("slide-{}", index),
            "type": kind,
            "title": format!("Slide number {}", index),
            "bullets": [
                "Revenue grew steadily this year",
                "Customer retention hit a record",
                "Costs stayed flat across regions"
            ],
            "speakerNotes": {
                "script": "Welcome back everyone. On this slide we walk through the headline numbers \
                           and explain what drove them, pausing for questions at the end.",
                "duration": "1min 30s",
                "tips": ["Make eye contact with the room"],
                "keyPoints": ["Growth was broad based", "Retention drives revenue"]
            },
            "imagePrompt": "Clean bar chart with upward trend in blue tones"
        })
    }

    pub(crate) fn presentation_json(num_slides: usize) -> Value {
        let slides: Vec<Value> = (1..=num_slides)
            .map(|i| {
                let kind = if i == 1 {
                    "title"
                } else if i == num_slides {
                    "conclusion"
                } else {
                    "content"
                };
                slide_json(i, kind)
            })
            .collect();

        json!({
            "title": "Quarterly Business Review",
            "subtitle": "Results, risks and the road ahead",
            "slides": slides
        })
    }
}

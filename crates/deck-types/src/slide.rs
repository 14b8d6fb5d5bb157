use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Position-dependent role of a slide within a deck.
///
/// The first slide of a presentation is always `Title`, the last is `Conclusion` and every
/// slide in between is `Content`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Title,
    Content,
    Conclusion,
}

impl SlideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideKind::Title => "title",
            SlideKind::Content => "content",
            SlideKind::Conclusion => "conclusion",
        }
    }

    /// The kind a slide must have at `index` in a deck of `total` slides.
    pub fn expected_at(index: usize, total: usize) -> SlideKind {
        if index == 0 {
            SlideKind::Title
        } else if index + 1 == total {
            SlideKind::Conclusion
        } else {
            SlideKind::Content
        }
    }
}

impl std::fmt::Display for SlideKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presenter-facing notes attached to a single slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerNotes {
    /// Conversational delivery script, typically two or three paragraphs.
    pub script: String,
    /// Estimated speaking time such as `2min 30s`.
    pub duration: String,
    pub tips: Vec<String>,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    /// `slide-<n>`
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SlideKind,
    pub title: String,
    pub bullets: Vec<String>,
    pub speaker_notes: SpeakerNotes,
    pub image_prompt: String,
    /// Filled in after generation by the image lookup collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A complete generated deck.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PresentationResponse {
    pub title: String,
    pub subtitle: String,
    pub slides: Vec<Slide>,
}

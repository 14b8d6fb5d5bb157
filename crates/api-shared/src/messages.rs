//! Request and response bodies of the HTTP API.

use deck_types::{BrandColors, Slide, Template};
use deckstream_core::{ErrorPayload, ExportRequest, ImageResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

fn default_num_slides() -> i64 {
    5
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Body of `POST /presentations/stream`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePresentationReq {
    /// Topic or brief for the deck, 1-500 characters.
    pub prompt: String,
    /// Number of slides to generate, 1-20. Defaults to 5.
    #[serde(default = "default_num_slides")]
    pub num_slides: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// Error envelope: `{ "error": { "code", "message" } }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: ErrorBody,
}

impl ErrorRes {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

impl From<ErrorPayload> for ErrorRes {
    fn from(payload: ErrorPayload) -> Self {
        Self::new(payload.code, payload.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExtractColorsReq {
    /// Logo as base64 or a `data:<mime>;base64,` URL.
    pub logo_base64: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ExtractColorsRes {
    pub success: bool,
    pub colors: BrandColors,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TemplatesRes {
    pub templates: Vec<Template>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerateImageReq {
    /// Image description, 1-500 characters.
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GenerateImageRes {
    pub url: Option<String>,
    pub alt: String,
}

impl From<ImageResult> for GenerateImageRes {
    fn from(result: ImageResult) -> Self {
        Self {
            url: result.url,
            alt: result.alt,
        }
    }
}

/// Body of `POST /presentations/export`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportPresentationReq {
    pub slides: Vec<Slide>,
    pub brand_colors: BrandColors,
    pub template: Template,
    #[serde(default)]
    pub presentation_title: Option<String>,
    #[serde(default)]
    pub presentation_subtitle: Option<String>,
}

impl From<ExportPresentationReq> for ExportRequest {
    fn from(req: ExportPresentationReq) -> Self {
        ExportRequest {
            slides: req.slides,
            brand_colors: req.brand_colors,
            template: req.template,
            presentation_title: req.presentation_title,
            presentation_subtitle: req.presentation_subtitle,
        }
    }
}

//! Deck-export collaborator interface.
//!
//! The binary deck writer lives outside this crate. This module defines what it is handed, what
//! it returns, and the checks applied before a request reaches it.

use crate::error::codes;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deck_types::{BrandColors, Rgb, Slide, Template};
use serde::{Deserialize, Serialize};

pub const PPTX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub slides: Vec<Slide>,
    pub brand_colors: BrandColors,
    pub template: Template,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presentation_subtitle: Option<String>,
}

impl ExportRequest {
    /// Checks the request is exportable: at least one slide and well-formed hex colours.
    pub fn validate(&self) -> Result<(), ExportFailure> {
        if self.slides.is_empty() {
            return Err(ExportFailure::Invalid("slides cannot be empty".into()));
        }

        let brand = [
            ("brandColors.primary", &self.brand_colors.primary),
            ("brandColors.secondary", &self.brand_colors.secondary),
            ("brandColors.accent", &self.brand_colors.accent),
            ("brandColors.background", &self.brand_colors.background),
            ("brandColors.text", &self.brand_colors.text),
        ];
        let template = [
            ("template.colors.background", &self.template.colors.background),
            ("template.colors.title", &self.template.colors.title),
            ("template.colors.text", &self.template.colors.text),
            ("template.colors.accent", &self.template.colors.accent),
        ];
        for (field, value) in brand.into_iter().chain(template) {
            Rgb::from_hex(value)
                .map_err(|e| ExportFailure::Invalid(format!("{}: {}", field, e)))?;
        }
        Ok(())
    }

    /// Title for the deck: the explicit override, else the first slide's title.
    pub fn title(&self) -> &str {
        self.presentation_title
            .as_deref()
            .or_else(|| self.slides.first().map(|s| s.title.as_str()))
            .unwrap_or_default()
    }
}

/// A written deck file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDeck {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportFailure {
    #[error("invalid export request: {0}")]
    Invalid(String),
    #[error("failed to write deck: {0}")]
    Writer(String),
}

impl ExportFailure {
    pub fn code(&self) -> &'static str {
        match self {
            ExportFailure::Invalid(_) => codes::VALIDATION_ERROR,
            ExportFailure::Writer(_) => codes::EXPORT_ERROR,
        }
    }
}

#[async_trait]
pub trait DeckExporter: Send + Sync {
    async fn export(&self, request: &ExportRequest) -> Result<ExportedDeck, ExportFailure>;
}

/// `presentation-<unix millis>.pptx`
pub fn export_filename(now: DateTime<Utc>) -> String {
    format!("presentation-{}.pptx", now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::template_by_id;
    use crate::validation::fixtures::slide_json;
    use chrono::TimeZone;

    fn request() -> ExportRequest {
        ExportRequest {
            slides: vec![serde_json::from_value(slide_json(1, "title")).expect("slide")],
            brand_colors: crate::palette::build_palette(&[]),
            template: template_by_id("modern").expect("modern exists"),
            presentation_title: None,
            presentation_subtitle: None,
        }
    }

    #[test]
    fn test_export_filename_uses_millis() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).single().expect("valid time");
        assert_eq!(export_filename(now), "presentation-1700000000123.pptx");
    }

    #[test]
    fn test_validate_accepts_well_formed_request() {
        let req = request();
        assert!(req.validate().is_ok());
        assert_eq!(req.title(), "Slide number 1");
    }

    #[test]
    fn test_validate_rejects_empty_slides() {
        let mut req = request();
        req.slides.clear();
        let err = req.validate().expect_err("no slides");
        assert!(matches!(err, ExportFailure::Invalid(_)));
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_validate_rejects_bad_colour() {
        let mut req = request();
        req.template.colors.accent = "cyan".into();
        let err = req.validate().expect_err("bad colour");
        assert!(matches!(err, ExportFailure::Invalid(msg) if msg.starts_with("template.colors.accent")));
    }

    #[test]
    fn test_request_wire_names() {
        let mut req = request();
        req.presentation_title = Some("Deck".into());
        let value = serde_json::to_value(&req).expect("serialise");
        assert!(value.get("brandColors").is_some());
        assert_eq!(value["presentationTitle"], "Deck");
        assert!(value.get("presentationSubtitle").is_none());
        assert_eq!(ExportFailure::Writer("disk full".into()).code(), "EXPORT_ERROR");
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Slide layout family used by the deck writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LayoutKind {
    Standard,
    Sidebar,
    Minimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TemplateColors {
    pub background: String,
    pub title: String,
    pub text: String,
    pub accent: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TemplateFonts {
    pub title: String,
    pub body: String,
}

/// Visual template descriptor handed to the deck-export collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Template {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Human-readable description of the look, shown in template pickers.
    pub preview: String,
    pub colors: TemplateColors,
    pub fonts: TemplateFonts,
    pub layout: LayoutKind,
}

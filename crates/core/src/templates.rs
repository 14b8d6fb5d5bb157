//! Built-in slide templates.

use deck_types::{BrandColors, LayoutKind, Template, TemplateColors, TemplateFonts};

fn template(
    id: &str,
    name: &str,
    description: &str,
    preview: &str,
    colors: [&str; 4],
    fonts: [&str; 2],
    layout: LayoutKind,
) -> Template {
    let [background, title, text, accent] = colors;
    let [title_font, body_font] = fonts;
    Template {
        id: id.to_owned(),
        name: name.to_owned(),
        description: description.to_owned(),
        preview: preview.to_owned(),
        colors: TemplateColors {
            background: background.to_owned(),
            title: title.to_owned(),
            text: text.to_owned(),
            accent: accent.to_owned(),
        },
        fonts: TemplateFonts {
            title: title_font.to_owned(),
            body: body_font.to_owned(),
        },
        layout,
    }
}

/// All built-in templates: `professional`, `modern` and `minimal`, in that order.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        template(
            "professional",
            "Professional",
            "Corporate template with clean design and emphasis on content",
            "Classic corporate design with navy blue primary, white backgrounds, and clear \
             typography. Perfect for business presentations.",
            ["#ffffff", "#1e3a8a", "#1f2937", "#3b82f6"],
            ["Helvetica, Arial, sans-serif", "Segoe UI, Tahoma, sans-serif"],
            LayoutKind::Standard,
        ),
        template(
            "modern",
            "Modern",
            "Contemporary design with vibrant colors and dynamic layout",
            "Trendy modern template with gradient backgrounds, bold typography, and accent \
             colors. Ideal for tech and startup presentations.",
            ["#f8fafc", "#0f172a", "#334155", "#06b6d4"],
            ["Inter, -apple-system, sans-serif", "Inter, -apple-system, sans-serif"],
            LayoutKind::Sidebar,
        ),
        template(
            "minimal",
            "Minimal",
            "Minimalist design focusing on content with whitespace",
            "Clean and minimal design with generous whitespace, single color accents, and \
             elegant typography. Best for academic or creative presentations.",
            ["#fafafa", "#000000", "#555555", "#666666"],
            ["Georgia, serif", "Lucida Grande, Trebuchet MS, sans-serif"],
            LayoutKind::Minimal,
        ),
    ]
}

pub fn template_by_id(id: &str) -> Option<Template> {
    builtin_templates().into_iter().find(|t| t.id == id)
}

/// Recolours a template with a brand palette. Fonts and layout are kept.
pub fn apply_brand_kit(template: &Template, colors: &BrandColors) -> Template {
    Template {
        colors: TemplateColors {
            background: colors.background.clone(),
            title: colors.primary.clone(),
            text: colors.text.clone(),
            accent: colors.accent.clone(),
        },
        ..template.clone()
    }
}

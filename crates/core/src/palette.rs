//! Brand palette extraction from logo images.
//!
//! Pixels are quantised into 16 buckets per channel, ranked by frequency and turned into a
//! five-colour [`BrandColors`] palette. All colour arithmetic is integer RGB.

use crate::constants::{
    BACKGROUND_LIGHTEN, DARK_PRIMARY_LUMINANCE, DOMINANT_SAMPLE_COUNT, LOGO_SAMPLE_EDGE,
    MIN_OPAQUE_ALPHA, MIN_SECONDARY_CONTRAST, QUANT_BUCKET_WIDTH,
};
use crate::error::codes;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use deck_types::{BrandColors, Rgb};
use image::imageops::FilterType;
use std::collections::HashMap;

const DEFAULT_PRIMARY: Rgb = Rgb::new(66, 135, 245);
const DEFAULT_SECONDARY: Rgb = Rgb::new(155, 155, 155);
const DARK_TEXT: Rgb = Rgb::new(20, 20, 20);
const LIGHT_TEXT: Rgb = Rgb::new(245, 245, 245);

#[derive(Debug, thiserror::Error)]
pub enum PaletteError {
    #[error("invalid logo input: {0}")]
    InvalidInput(String),
    #[error("logo is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("failed to decode logo image: {0}")]
    Decode(#[from] image::ImageError),
}

impl PaletteError {
    /// `VALIDATION_ERROR` for bad input, `EXTRACTION_ERROR` when processing fails.
    pub fn code(&self) -> &'static str {
        match self {
            PaletteError::InvalidInput(_) | PaletteError::Base64(_) => codes::VALIDATION_ERROR,
            PaletteError::Decode(_) => codes::EXTRACTION_ERROR,
        }
    }
}

pub type PaletteResult<T> = std::result::Result<T, PaletteError>;

/// Returns up to `k` dominant colours of an RGBA8 buffer, most frequent first.
///
/// Pixels with alpha below 128 are skipped. Buckets with equal counts keep the order in which
/// they were first seen. Each sample is the bucket's lower corner (`bucket * 16`).
pub fn dominant_colors(rgba: &[u8], k: usize) -> Vec<Rgb> {
    let mut buckets: HashMap<(u8, u8, u8), (usize, usize)> = HashMap::new();

    for pixel in rgba.chunks_exact(4) {
        if pixel[3] < MIN_OPAQUE_ALPHA {
            continue;
        }
        let key = (
            pixel[0] / QUANT_BUCKET_WIDTH,
            pixel[1] / QUANT_BUCKET_WIDTH,
            pixel[2] / QUANT_BUCKET_WIDTH,
        );
        let seen = buckets.len();
        buckets.entry(key).or_insert((0, seen)).0 += 1;
    }

    let mut ranked: Vec<_> = buckets.into_iter().collect();
    ranked.sort_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
        count_b.cmp(count_a).then(first_a.cmp(first_b))
    });

    ranked
        .into_iter()
        .take(k)
        .map(|((r, g, b), _)| {
            Rgb::new(
                r * QUANT_BUCKET_WIDTH,
                g * QUANT_BUCKET_WIDTH,
                b * QUANT_BUCKET_WIDTH,
            )
        })
        .collect()
}

/// Derives a brand palette from dominant samples, most frequent first.
pub fn build_palette(samples: &[Rgb]) -> BrandColors {
    let primary = samples.first().copied().unwrap_or(DEFAULT_PRIMARY);

    let text = if primary.relative_luminance() < DARK_PRIMARY_LUMINANCE {
        LIGHT_TEXT
    } else {
        DARK_TEXT
    };

    let mut secondary = samples.get(1).copied().unwrap_or(DEFAULT_SECONDARY);
    if primary.contrast_ratio(&secondary) < MIN_SECONDARY_CONTRAST {
        if let Some(third) = samples.get(2) {
            secondary = *third;
        }
    }

    BrandColors {
        primary: primary.to_hex(),
        secondary: secondary.to_hex(),
        accent: primary.complement().to_hex(),
        background: primary.lighten(BACKGROUND_LIGHTEN).to_hex(),
        text: text.to_hex(),
    }
}

/// Decodes an encoded logo (PNG, JPEG, GIF, WebP, ...) and derives its palette.
///
/// Images larger than 200×200 are shrunk to fit, preserving aspect ratio; smaller images are
/// sampled as-is.
pub fn extract_brand_colors(encoded: &[u8]) -> PaletteResult<BrandColors> {
    if encoded.is_empty() {
        return Err(PaletteError::InvalidInput("logo is empty".into()));
    }

    let mut img = image::load_from_memory(encoded)?;
    if img.width() > LOGO_SAMPLE_EDGE || img.height() > LOGO_SAMPLE_EDGE {
        img = img.resize(LOGO_SAMPLE_EDGE, LOGO_SAMPLE_EDGE, FilterType::Triangle);
    }

    let rgba = img.to_rgba8();
    let samples = dominant_colors(rgba.as_raw(), DOMINANT_SAMPLE_COUNT);
    tracing::debug!(samples = samples.len(), "extracted dominant colours");
    Ok(build_palette(&samples))
}

/// Decodes a logo sent as raw base64 or as a `data:<mime>;base64,` URL.
pub fn decode_logo_base64(input: &str) -> PaletteResult<Vec<u8>> {
    let input = input.trim();
    let payload = match input.strip_prefix("data:") {
        Some(rest) => {
            let (header, data) = rest
                .split_once(',')
                .ok_or_else(|| PaletteError::InvalidInput("data URL has no payload".into()))?;
            if !header.ends_with(";base64") {
                return Err(PaletteError::InvalidInput(
                    "data URL must be base64 encoded".into(),
                ));
            }
            data
        }
        None => input,
    };

    if payload.is_empty() {
        return Err(PaletteError::InvalidInput("logo is empty".into()));
    }
    Ok(BASE64.decode(payload)?)
}

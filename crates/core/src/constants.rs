//! Constants used throughout the deckstream core crate.
//!
//! Field bounds live here so that the prompt builder and the schema validator can never drift
//! apart: the model is told exactly the limits it will be checked against.

use std::ops::RangeInclusive;
use std::time::Duration;

/// Default Gemini model used for deck generation.
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Base URL of the Gemini generative language API.
pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Base URL of the Unsplash API used for slide image lookup.
pub const UNSPLASH_API_BASE: &str = "https://api.unsplash.com";

/// Maximum request duration permitted by the hosting platform.
pub const PLATFORM_MAX_REQUEST: Duration = Duration::from_secs(60);

/// Safety margin kept between the stream budget and the platform limit.
pub const STREAM_BUDGET_MARGIN: Duration = Duration::from_secs(5);

/// Default wall-clock budget for one streaming generation (55 seconds).
pub const DEFAULT_STREAM_BUDGET: Duration =
    Duration::from_secs(PLATFORM_MAX_REQUEST.as_secs() - STREAM_BUDGET_MARGIN.as_secs());

/// Upper bound accepted for a configured stream budget, in seconds.
pub const MAX_STREAM_BUDGET_SECS: u64 = 600;

/// Capacity of the per-request event channel between orchestrator and transport.
pub const EVENT_CHANNEL_CAPACITY: usize = 16;

// Request bounds.
pub const PROMPT_CHARS: RangeInclusive<usize> = 1..=500;
pub const NUM_SLIDES: RangeInclusive<usize> = 1..=20;

// Presentation bounds.
pub const PRESENTATION_TITLE_CHARS: RangeInclusive<usize> = 5..=100;
pub const PRESENTATION_SUBTITLE_CHARS: RangeInclusive<usize> = 5..=200;

// Slide bounds.
pub const SLIDE_ID_PREFIX: &str = "slide-";
pub const SLIDE_TITLE_CHARS: RangeInclusive<usize> = 3..=100;
pub const BULLET_COUNT: RangeInclusive<usize> = 3..=5;
pub const BULLET_CHARS: RangeInclusive<usize> = 5..=120;
pub const IMAGE_PROMPT_CHARS: RangeInclusive<usize> = 20..=300;

// Speaker notes bounds.
pub const SCRIPT_CHARS: RangeInclusive<usize> = 100..=1000;
pub const TIP_COUNT: RangeInclusive<usize> = 1..=3;
pub const TIP_CHARS: RangeInclusive<usize> = 10..=200;
pub const KEY_POINT_COUNT: RangeInclusive<usize> = 2..=4;
pub const KEY_POINT_CHARS: RangeInclusive<usize> = 10..=100;

// Colour extraction.
/// Width of one quantisation bucket per channel (256 / 16 buckets).
pub const QUANT_BUCKET_WIDTH: u8 = 16;
/// Pixels with alpha below this value are ignored.
pub const MIN_OPAQUE_ALPHA: u8 = 128;
/// Number of dominant samples taken from a logo.
pub const DOMINANT_SAMPLE_COUNT: usize = 8;
/// Logos are shrunk to fit this square before sampling.
pub const LOGO_SAMPLE_EDGE: u32 = 200;
/// Minimum primary/secondary contrast before the third sample is preferred.
pub const MIN_SECONDARY_CONTRAST: f64 = 3.0;
/// Per-channel offset used to derive the background colour from the primary.
pub const BACKGROUND_LIGHTEN: u8 = 40;
/// Primary luminance below which text flips to the light variant.
pub const DARK_PRIMARY_LUMINANCE: f64 = 0.5;

/// Maximum number of keywords sent to the image search provider.
pub const MAX_IMAGE_KEYWORDS: usize = 5;

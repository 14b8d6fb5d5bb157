//! Generation error taxonomy.
//!
//! Failures reported by the model provider are opaque text, so they are mapped onto a closed set
//! of [`FailureKind`]s by keyword inspection. The classification is best effort: providers do not
//! guarantee message wording, and an unrecognised message always falls back to
//! [`FailureKind::Generation`].

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Closed set of generation failure kinds, each with a stable wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Credential missing or rejected by the provider. Not retryable.
    InvalidApiKey,
    /// Provider-side quota exhausted. Retryable with backoff at the caller's discretion.
    QuotaExceeded,
    /// Transient throttling. Retryable.
    RateLimitExceeded,
    /// The model refused the request on safety grounds. Not retryable for the same input.
    ContentFiltered,
    /// Malformed output, timeout or an unclassified provider fault.
    Generation,
}

impl FailureKind {
    pub fn code(&self) -> &'static str {
        match self {
            FailureKind::InvalidApiKey => "INVALID_API_KEY",
            FailureKind::QuotaExceeded => "QUOTA_EXCEEDED",
            FailureKind::RateLimitExceeded => "RATE_LIMIT_EXCEEDED",
            FailureKind::ContentFiltered => "CONTENT_FILTER",
            FailureKind::Generation => "GENERATION_ERROR",
        }
    }

    /// HTTP status associated with the kind when it is reported outside of an event stream.
    pub fn http_status(&self) -> u16 {
        match self {
            FailureKind::InvalidApiKey => 401,
            FailureKind::QuotaExceeded | FailureKind::RateLimitExceeded => 429,
            FailureKind::ContentFiltered => 400,
            FailureKind::Generation => 500,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureKind::QuotaExceeded | FailureKind::RateLimitExceeded
        )
    }

    fn default_message(&self) -> &'static str {
        match self {
            FailureKind::InvalidApiKey => "Invalid or missing API key",
            FailureKind::QuotaExceeded => "API quota exceeded",
            FailureKind::RateLimitExceeded => "Rate limit exceeded",
            FailureKind::ContentFiltered => "Content was filtered by safety filters",
            FailureKind::Generation => "Error generating content",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A classified generation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct GenerationFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl GenerationFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            kind.default_message().to_owned()
        } else {
            message
        };
        Self { kind, message }
    }

    /// Builds a failure by classifying a raw provider message.
    pub fn classify(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(classify_failure(&message), message)
    }

    pub fn timeout(budget: Duration) -> Self {
        Self::new(
            FailureKind::Generation,
            format!("Stream timeout exceeded ({}s budget)", budget.as_secs()),
        )
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_owned(),
            message: self.message.clone(),
        }
    }
}

/// Maps a raw provider failure message onto a [`FailureKind`].
///
/// Matching is case-insensitive. Explicit wording wins over bare status codes, so a message such
/// as `429 rate limit exceeded` classifies as [`FailureKind::RateLimitExceeded`] while a bare
/// `429` is treated as quota exhaustion.
pub fn classify_failure(message: &str) -> FailureKind {
    let message = message.to_lowercase();
    let has = |needle: &str| message.contains(needle);

    if has("api key") || has("api_key") || has("unauthorized") || has("permission denied") {
        FailureKind::InvalidApiKey
    } else if has("quota") {
        FailureKind::QuotaExceeded
    } else if has("rate limit") || has("ratelimit") {
        FailureKind::RateLimitExceeded
    } else if has("429") {
        FailureKind::QuotaExceeded
    } else if has("filter") || has("blocked") || has("safety") {
        FailureKind::ContentFiltered
    } else {
        FailureKind::Generation
    }
}

/// Request-level error codes that sit outside the provider taxonomy.
pub mod codes {
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const REQUEST_ERROR: &str = "REQUEST_ERROR";
    pub const SLIDE_COUNT_MISMATCH: &str = "SLIDE_COUNT_MISMATCH";
    pub const EXTRACTION_ERROR: &str = "EXTRACTION_ERROR";
    pub const EXPORT_ERROR: &str = "EXPORT_ERROR";
    pub const EXPORT_UNAVAILABLE: &str = "EXPORT_UNAVAILABLE";
}

/// Wire shape of an error: `{ code, message }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while resolving configuration at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    InvalidInput(String),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

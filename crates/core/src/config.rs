//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services, so that
//! request handling never reads process-wide environment variables.

use crate::constants::{DEFAULT_MODEL, DEFAULT_STREAM_BUDGET, MAX_STREAM_BUDGET_SECS};
use crate::error::{ConfigError, ConfigResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone)]
pub struct CoreConfig {
    gemini_api_key: Option<String>,
    gemini_model: String,
    stream_budget: Duration,
    unsplash_access_key: Option<String>,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// Blank credentials are treated as absent.
    pub fn new(
        gemini_api_key: Option<String>,
        gemini_model: String,
        stream_budget: Duration,
        unsplash_access_key: Option<String>,
    ) -> ConfigResult<Self> {
        if gemini_model.trim().is_empty() {
            return Err(ConfigError::InvalidInput(
                "gemini_model cannot be empty".into(),
            ));
        }
        if stream_budget.is_zero() || stream_budget.as_secs() > MAX_STREAM_BUDGET_SECS {
            return Err(ConfigError::InvalidInput(format!(
                "stream budget must be between 1 and {} seconds",
                MAX_STREAM_BUDGET_SECS
            )));
        }

        Ok(Self {
            gemini_api_key: non_blank(gemini_api_key),
            gemini_model: gemini_model.trim().to_owned(),
            stream_budget,
            unsplash_access_key: non_blank(unsplash_access_key),
        })
    }

    pub fn gemini_api_key(&self) -> Option<&str> {
        self.gemini_api_key.as_deref()
    }

    pub fn gemini_model(&self) -> &str {
        &self.gemini_model
    }

    pub fn stream_budget(&self) -> Duration {
        self.stream_budget
    }

    pub fn unsplash_access_key(&self) -> Option<&str> {
        self.unsplash_access_key.as_deref()
    }
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_model", &self.gemini_model)
            .field("stream_budget", &self.stream_budget)
            .field(
                "unsplash_access_key",
                &self.unsplash_access_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the model name from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MODEL`].
pub fn gemini_model_from_env_value(value: Option<String>) -> String {
    non_blank(value).unwrap_or_else(|| DEFAULT_MODEL.to_owned())
}

/// Parse the stream budget (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_STREAM_BUDGET`].
pub fn stream_budget_from_env_value(value: Option<String>) -> ConfigResult<Duration> {
    let Some(value) = non_blank(value) else {
        return Ok(DEFAULT_STREAM_BUDGET);
    };

    let secs: u64 = value.parse().map_err(|_| {
        ConfigError::InvalidInput(format!(
            "DECKSTREAM_STREAM_BUDGET_SECS must be a whole number of seconds (got '{}')",
            value
        ))
    })?;
    if secs == 0 || secs > MAX_STREAM_BUDGET_SECS {
        return Err(ConfigError::InvalidInput(format!(
            "DECKSTREAM_STREAM_BUDGET_SECS must be between 1 and {} (got {})",
            MAX_STREAM_BUDGET_SECS, secs
        )));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_budget_defaults_to_55_seconds() {
        assert_eq!(
            stream_budget_from_env_value(None).expect("default"),
            Duration::from_secs(55)
        );
        assert_eq!(
            stream_budget_from_env_value(Some("  ".into())).expect("default"),
            Duration::from_secs(55)
        );
    }

    #[test]
    fn test_stream_budget_parses_seconds() {
        assert_eq!(
            stream_budget_from_env_value(Some(" 30 ".into())).expect("valid"),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_stream_budget_rejects_out_of_range() {
        for bad in ["0", "601", "-5", "ten", "1.5"] {
            let err = stream_budget_from_env_value(Some(bad.into())).expect_err(bad);
            assert!(matches!(err, ConfigError::InvalidInput(_)));
        }
    }

    #[test]
    fn test_blank_credentials_are_absent() {
        let cfg = CoreConfig::new(
            Some("   ".into()),
            gemini_model_from_env_value(None),
            DEFAULT_STREAM_BUDGET,
            Some("key".into()),
        )
        .expect("valid config");
        assert_eq!(cfg.gemini_api_key(), None);
        assert_eq!(cfg.gemini_model(), "gemini-2.5-pro");
        assert_eq!(cfg.unsplash_access_key(), Some("key"));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let cfg = CoreConfig::new(
            Some("secret-key".into()),
            "gemini-2.5-flash".into(),
            DEFAULT_STREAM_BUDGET,
            None,
        )
        .expect("valid config");
        let debug = format!("{:?}", cfg);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_empty_model_rejected() {
        let err = CoreConfig::new(None, " ".into(), DEFAULT_STREAM_BUDGET, None)
            .expect_err("empty model");
        assert!(matches!(err, ConfigError::InvalidInput(_)));
    }
}

//! Stock image lookup for slide image prompts.

use crate::constants::{MAX_IMAGE_KEYWORDS, UNSPLASH_API_BASE};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const STOP_WORDS: [&str; 42] = [
    "a", "an", "the", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "can", "about", "as",
    "this", "that", "these", "those",
];

#[derive(Debug, thiserror::Error)]
pub enum ImageLookupError {
    #[error("image search request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("image search returned HTTP {0}")]
    Status(u16),
}

/// Resolved image for a prompt. `url` is `None` when nothing was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResult {
    pub url: Option<String>,
    pub alt: String,
}

impl ImageResult {
    pub fn not_found(prompt: &str) -> Self {
        Self {
            url: None,
            alt: prompt.to_owned(),
        }
    }
}

/// Extracts up to five search keywords from an image prompt.
///
/// Words are lowercased and stripped of everything except word characters and `-`; stop words and
/// words of two characters or fewer are dropped, and duplicates keep their first position.
pub fn prompt_keywords(prompt: &str) -> Vec<String> {
    let mut keywords: Vec<String> = Vec::new();
    for word in prompt.to_lowercase().split_whitespace() {
        let cleaned: String = word
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
            .collect();
        if cleaned.chars().count() <= 2 || STOP_WORDS.contains(&cleaned.as_str()) {
            continue;
        }
        if !keywords.contains(&cleaned) {
            keywords.push(cleaned);
        }
        if keywords.len() == MAX_IMAGE_KEYWORDS {
            break;
        }
    }
    keywords
}

#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// Finds an image for `prompt`. Lookup failures degrade to [`ImageResult::not_found`].
    async fn find_image(&self, prompt: &str) -> ImageResult;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<UnsplashPhoto>,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: PhotoUrls,
    alt_description: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotoUrls {
    regular: String,
}

impl UnsplashPhoto {
    fn into_result(self, prompt: &str) -> ImageResult {
        let alt = [self.alt_description, self.description]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| prompt.to_owned());
        ImageResult {
            url: Some(self.urls.regular),
            alt,
        }
    }
}

/// Unsplash search client. Without an access key every lookup resolves to "not found".
#[derive(Clone)]
pub struct UnsplashClient {
    http: reqwest::Client,
    access_key: Option<String>,
    base_url: String,
}

impl UnsplashClient {
    pub fn new(access_key: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            access_key,
            base_url: UNSPLASH_API_BASE.to_owned(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    async fn search(&self, access_key: &str, query: &str) -> Result<Option<UnsplashPhoto>, ImageLookupError> {
        let resp = self
            .http
            .get(format!("{}/search/photos", self.base_url))
            .query(&[
                ("query", query),
                ("orientation", "landscape"),
                ("per_page", "1"),
                ("order_by", "relevant"),
            ])
            .header("Authorization", format!("Client-ID {}", access_key))
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(ImageLookupError::Status(resp.status().as_u16()));
        }
        let body: SearchResponse = resp.json().await?;
        Ok(body.results.into_iter().next())
    }
}

impl std::fmt::Debug for UnsplashClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnsplashClient")
            .field("configured", &self.access_key.is_some())
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    async fn find_image(&self, prompt: &str) -> ImageResult {
        let Some(access_key) = self.access_key.as_deref() else {
            tracing::debug!("no Unsplash access key configured");
            return ImageResult::not_found(prompt);
        };
        let keywords = prompt_keywords(prompt);
        if keywords.is_empty() {
            return ImageResult::not_found(prompt);
        }

        match self.search(access_key, &keywords.join(" ")).await {
            Ok(Some(photo)) => photo.into_result(prompt),
            Ok(None) => ImageResult::not_found(prompt),
            Err(e) => {
                tracing::warn!("image search failed: {}", e);
                ImageResult::not_found(prompt)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_keywords_drops_stop_words_and_short_words() {
        assert_eq!(
            prompt_keywords("A modern office with the team at work, in soft light"),
            vec!["modern", "office", "team", "work", "soft"]
        );
    }

    #[test]
    fn test_prompt_keywords_keeps_hyphens_and_dedupes() {
        assert_eq!(
            prompt_keywords("High-tech DATA center, data center!"),
            vec!["high-tech", "data", "center"]
        );
        assert!(prompt_keywords("a to of it").is_empty());
    }

    #[test]
    fn test_photo_alt_falls_back_to_prompt() {
        let photo = UnsplashPhoto {
            urls: PhotoUrls {
                regular: "https://images.example/1".into(),
            },
            alt_description: None,
            description: Some("".into()),
        };
        let result = photo.into_result("solar panels");
        assert_eq!(result.url.as_deref(), Some("https://images.example/1"));
        assert_eq!(result.alt, "solar panels");
    }

    #[tokio::test]
    async fn test_missing_access_key_is_not_found() {
        let client = UnsplashClient::new(None);
        assert_eq!(
            client.find_image("Solar panels on a roof").await,
            ImageResult::not_found("Solar panels on a roof")
        );
    }

    #[tokio::test]
    async fn test_prompt_without_keywords_is_not_found() {
        let client = UnsplashClient::new(Some("key".into())).with_base_url("http://127.0.0.1:9");
        assert_eq!(client.find_image("a of it").await.url, None);
    }
}

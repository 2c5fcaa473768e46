//! HTTP metadata acquisition: oEmbed endpoints, then Open Graph tags.
//!
//! Platform oEmbed endpoints are tried first where they exist without
//! authentication (YouTube, TikTok); a generic page scrape of Open Graph
//! tags fills whatever is still missing. Both methods are best-effort:
//! partially filled metadata is a normal result.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::platform::Platform;
use crate::security::UrlValidator;
use crate::sources::{meta_content, title_tag};
use crate::traits::metadata::MetadataSource;
use crate::types::card::Creator;
use crate::types::metadata::PostMetadata;

/// Standard oEmbed response fields we consume.
#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    author_url: Option<String>,
    thumbnail_url: Option<String>,
}

pub struct HttpMetadataSource {
    client: reqwest::Client,
    validator: UrlValidator,
    user_agent: String,
}

impl Default for HttpMetadataSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpMetadataSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            validator: UrlValidator::new(),
            user_agent: "CookCardBot/1.0".to_string(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    fn oembed_endpoint(url: &str, platform: Platform) -> Option<String> {
        let encoded = urlencode(url);
        match platform {
            Platform::YouTube => Some(format!(
                "https://www.youtube.com/oembed?url={encoded}&format=json"
            )),
            Platform::TikTok => Some(format!("https://www.tiktok.com/oembed?url={encoded}")),
            _ => None,
        }
    }

    async fn fetch_oembed(&self, endpoint: &str) -> FetchResult<OEmbedResponse> {
        let response = self
            .client
            .get(endpoint)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: endpoint.to_string(),
            });
        }

        response
            .json::<OEmbedResponse>()
            .await
            .map_err(|e| FetchError::Malformed {
                url: endpoint.to_string(),
                reason: e.to_string(),
            })
    }

    async fn fetch_html(&self, url: &str) -> FetchResult<String> {
        self.validator.validate(url)?;

        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))
    }

    /// Fill fields from Open Graph tags (and platform-specific page data).
    fn apply_page_fields(metadata: &mut PostMetadata, html: &str) {
        if metadata.title.is_none() {
            metadata.title = meta_content(html, "og:title").or_else(|| title_tag(html));
        }
        if metadata.description.is_none() {
            metadata.description =
                meta_content(html, "og:description").or_else(|| meta_content(html, "description"));
        }
        if metadata.thumbnail_url.is_none() {
            metadata.thumbnail_url = meta_content(html, "og:image");
        }
        if metadata.duration_seconds.is_none() {
            metadata.duration_seconds = meta_content(html, "og:video:duration")
                .or_else(|| meta_content(html, "video:duration"))
                .and_then(|d| d.parse().ok())
                .or_else(|| page_length_seconds(html));
        }
        if metadata.media_url.is_none() {
            metadata.media_url = meta_content(html, "og:video")
                .or_else(|| meta_content(html, "og:video:url"));
        }
    }
}

/// YouTube watch pages embed the duration as `"lengthSeconds":"212"`.
fn page_length_seconds(html: &str) -> Option<u32> {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = RE.get_or_init(|| regex::Regex::new(r#""lengthSeconds"\s*:\s*"(\d+)""#).unwrap());
    re.captures(html).and_then(|c| c[1].parse().ok())
}

fn urlencode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[async_trait]
impl MetadataSource for HttpMetadataSource {
    async fn fetch(&self, url: &str, platform: Platform) -> FetchResult<PostMetadata> {
        let mut metadata = PostMetadata::new(url, platform);
        let mut acquired_any = false;

        if let Some(endpoint) = Self::oembed_endpoint(url, platform) {
            match self.fetch_oembed(&endpoint).await {
                Ok(oembed) => {
                    metadata.title = oembed.title;
                    metadata.thumbnail_url = oembed.thumbnail_url;
                    if oembed.author_name.is_some() || oembed.author_url.is_some() {
                        metadata.creator = Some(Creator {
                            name: oembed.author_name,
                            handle: oembed.author_url,
                            avatar_url: None,
                            verified: false,
                        });
                    }
                    acquired_any = true;
                }
                Err(e) => {
                    tracing::debug!(url, error = %e, "oEmbed fetch failed, falling back to page scrape");
                }
            }
        }

        match self.fetch_html(url).await {
            Ok(html) => {
                Self::apply_page_fields(&mut metadata, &html);
                acquired_any = true;
            }
            Err(e) => {
                tracing::debug!(url, error = %e, "page scrape failed");
                if !acquired_any {
                    return Err(e);
                }
            }
        }

        Ok(metadata)
    }

    fn name(&self) -> &str {
        "http_metadata"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oembed_endpoint_selection() {
        assert!(HttpMetadataSource::oembed_endpoint(
            "https://youtube.com/watch?v=abc",
            Platform::YouTube
        )
        .unwrap()
        .contains("youtube.com/oembed"));

        assert!(HttpMetadataSource::oembed_endpoint(
            "https://tiktok.com/@u/video/1",
            Platform::TikTok
        )
        .unwrap()
        .contains("tiktok.com/oembed"));

        assert!(
            HttpMetadataSource::oembed_endpoint("https://example.com", Platform::Web).is_none()
        );
    }

    #[test]
    fn test_apply_page_fields() {
        let html = r#"
            <meta property="og:title" content="Garlic Noodles" />
            <meta property="og:description" content="15 minute dinner" />
            <meta property="og:image" content="https://cdn.example/thumb.jpg" />
            <meta property="og:video:duration" content="95" />
        "#;
        let mut metadata = PostMetadata::new("https://example.com/p", Platform::Web);
        HttpMetadataSource::apply_page_fields(&mut metadata, html);

        assert_eq!(metadata.title.as_deref(), Some("Garlic Noodles"));
        assert_eq!(metadata.description.as_deref(), Some("15 minute dinner"));
        assert_eq!(metadata.duration_seconds, Some(95));
    }

    #[test]
    fn test_page_length_seconds() {
        let html = r#"{"videoDetails":{"lengthSeconds":"212","title":"x"}}"#;
        assert_eq!(page_length_seconds(html), Some(212));
        assert_eq!(page_length_seconds("<html></html>"), None);
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(
            urlencode("https://a.b/c?d=e"),
            "https%3A%2F%2Fa.b%2Fc%3Fd%3De"
        );
    }
}

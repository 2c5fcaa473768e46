//! Caption track fetch via the YouTube timedtext endpoint.
//!
//! Only YouTube exposes captions without authentication; other platforms
//! report "no transcript" and the ladder moves on.

use async_trait::async_trait;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{FetchError, FetchResult};
use crate::platform::Platform;
use crate::sources::decode_entities;
use crate::traits::transcript::TranscriptSource;
use crate::types::metadata::Transcript;

pub struct HttpTranscriptSource {
    client: reqwest::Client,
    language: String,
}

impl Default for HttpTranscriptSource {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpTranscriptSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .expect("Failed to create HTTP client"),
            language: "en".to_string(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

/// Pull the video id out of a YouTube URL (`watch?v=`, `/shorts/`,
/// `/embed/`).
pub fn youtube_video_id(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;

    if let Some((_, id)) = parsed.query_pairs().find(|(k, _)| k == "v") {
        if !id.is_empty() {
            return Some(id.into_owned());
        }
    }

    let mut segments = parsed.path_segments()?;
    match segments.next() {
        Some("shorts") | Some("embed") | Some("v") => {
            segments.next().map(String::from).filter(|s| !s.is_empty())
        }
        _ => None,
    }
}

fn caption_re() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"(?s)<text[^>]*>(.*?)</text>").unwrap())
}

/// Join timedtext XML caption lines into plain text.
pub fn parse_timedtext(xml: &str) -> String {
    let mut lines = Vec::new();
    for captures in caption_re().captures_iter(xml) {
        let line = decode_entities(captures[1].trim());
        if !line.is_empty() {
            lines.push(line);
        }
    }
    lines.join(" ")
}

#[async_trait]
impl TranscriptSource for HttpTranscriptSource {
    async fn fetch_transcript(
        &self,
        url: &str,
        platform: Platform,
    ) -> FetchResult<Option<Transcript>> {
        if platform != Platform::YouTube {
            return Ok(None);
        }
        let Some(video_id) = youtube_video_id(url) else {
            return Ok(None);
        };

        let endpoint = format!(
            "https://video.google.com/timedtext?lang={}&v={video_id}",
            self.language
        );
        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;

        if !response.status().is_success() {
            // No caption track published; expected empty result
            return Ok(None);
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Http(Box::new(e)))?;
        let text = parse_timedtext(&body);

        if text.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Transcript {
                text,
                language: Some(self.language.clone()),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_id_forms() {
        assert_eq!(
            youtube_video_id("https://youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".into())
        );
        assert_eq!(
            youtube_video_id("https://youtube.com/shorts/abc123"),
            Some("abc123".into())
        );
        assert_eq!(
            youtube_video_id("https://youtube.com/embed/xyz"),
            Some("xyz".into())
        );
        assert_eq!(youtube_video_id("https://youtube.com/feed/library"), None);
    }

    #[test]
    fn test_parse_timedtext() {
        let xml = r#"<?xml version="1.0"?><transcript>
            <text start="0" dur="2">today we&#39;re making</text>
            <text start="2" dur="3">garlic butter noodles</text>
            <text start="5" dur="1"></text>
        </transcript>"#;
        assert_eq!(
            parse_timedtext(xml),
            "today we're making garlic butter noodles"
        );
    }

    #[test]
    fn test_parse_timedtext_empty() {
        assert_eq!(parse_timedtext("<transcript></transcript>"), "");
    }
}

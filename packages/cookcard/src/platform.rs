//! URL normalization and platform classification.
//!
//! Classification never fails: hosts that match no known platform map to
//! [`Platform::Web`], which routes through the structured-data fast path
//! instead of the social-media text ladder.

use serde::{Deserialize, Serialize};
use url::Url;

/// Source platform of a post URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Instagram,
    TikTok,
    YouTube,
    Facebook,
    /// Anything that is not a known social platform (recipe blogs, news
    /// sites, aggregators).
    Web,
}

impl Platform {
    /// Social-media platforms skip the structured-data fast path.
    pub fn is_social(&self) -> bool {
        !matches!(self, Platform::Web)
    }

    /// Platforms whose posts are primarily video content.
    pub fn is_video(&self) -> bool {
        matches!(
            self,
            Platform::Instagram | Platform::TikTok | Platform::YouTube | Platform::Facebook
        )
    }

    /// Comment harvesting is available for the YouTube family only.
    pub fn supports_comment_harvest(&self) -> bool {
        matches!(self, Platform::YouTube)
    }

    /// Stable lowercase name for logging and telemetry.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::TikTok => "tiktok",
            Platform::YouTube => "youtube",
            Platform::Facebook => "facebook",
            Platform::Web => "web",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify a parsed URL into a platform.
pub fn classify(url: &Url) -> Platform {
    let host = url.host_str().unwrap_or("").to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host == "instagram.com" || host.ends_with(".instagram.com") {
        Platform::Instagram
    } else if host == "tiktok.com" || host.ends_with(".tiktok.com") {
        Platform::TikTok
    } else if host == "youtube.com" || host.ends_with(".youtube.com") || host == "youtu.be" {
        Platform::YouTube
    } else if host == "facebook.com" || host.ends_with(".facebook.com") || host == "fb.watch" {
        Platform::Facebook
    } else {
        Platform::Web
    }
}

/// Query parameters that carry no content identity and poison cache keys.
const TRACKING_PARAMS: &[&str] = &[
    "fbclid", "gclid", "igsh", "igshid", "si", "feature", "ref", "ref_src", "s", "t",
];

/// Canonicalize a raw URL string.
///
/// - lowercases the host and strips a leading `www.`
/// - rewrites `youtu.be/<id>` short links to `youtube.com/watch?v=<id>`
/// - drops tracking query parameters and the fragment
///
/// Returns the parsed, normalized URL. Parse failure is the only error;
/// classification of the result cannot fail.
pub fn normalize_url(raw: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(raw.trim())?;

    let host = url.host_str().unwrap_or("").to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host).to_string();

    // Short-link rewrite: youtu.be/<id> -> youtube.com/watch?v=<id>
    if host == "youtu.be" {
        let id = url.path().trim_matches('/').to_string();
        if !id.is_empty() {
            let mut rewritten = Url::parse("https://youtube.com/watch")?;
            rewritten.query_pairs_mut().append_pair("v", &id);
            url = rewritten;
        }
    } else {
        // set_host only fails for cannot-be-a-base URLs, which http(s) never are
        let _ = url.set_host(Some(&host));
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| {
            let k = k.to_ascii_lowercase();
            !k.starts_with("utm_") && !TRACKING_PARAMS.contains(&k.as_str())
        })
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    url.set_query(None);
    if !kept.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (k, v) in &kept {
            pairs.append_pair(k, v);
        }
    }
    url.set_fragment(None);

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_known_hosts() {
        let cases = [
            ("https://www.instagram.com/reel/abc/", Platform::Instagram),
            ("https://www.tiktok.com/@user/video/123", Platform::TikTok),
            ("https://youtube.com/watch?v=abc", Platform::YouTube),
            ("https://youtu.be/abc", Platform::YouTube),
            ("https://m.youtube.com/watch?v=abc", Platform::YouTube),
            ("https://fb.watch/xyz/", Platform::Facebook),
            ("https://smittenkitchen.com/2020/03/pasta/", Platform::Web),
        ];
        for (raw, expected) in cases {
            let url = Url::parse(raw).unwrap();
            assert_eq!(classify(&url), expected, "{raw}");
        }
    }

    #[test]
    fn test_normalize_strips_tracking() {
        let url =
            normalize_url("https://www.youtube.com/watch?v=abc&utm_source=x&si=yyy&feature=share")
                .unwrap();
        assert_eq!(url.as_str(), "https://youtube.com/watch?v=abc");
    }

    #[test]
    fn test_normalize_rewrites_short_link() {
        let url = normalize_url("https://youtu.be/dQw4w9WgXcQ?si=abc123").unwrap();
        assert_eq!(url.as_str(), "https://youtube.com/watch?v=dQw4w9WgXcQ");
        assert_eq!(classify(&url), Platform::YouTube);
    }

    #[test]
    fn test_normalize_drops_fragment() {
        let url = normalize_url("https://example.com/recipe#comments").unwrap();
        assert_eq!(url.as_str(), "https://example.com/recipe");
    }

    #[test]
    fn test_unknown_platform_is_web() {
        let url = Url::parse("https://totally-unknown.example").unwrap();
        assert_eq!(classify(&url), Platform::Web);
        assert!(!classify(&url).is_social());
    }
}

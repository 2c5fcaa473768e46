//! Provider implementations of the acquisition capabilities.

pub mod jsonld;
pub mod oembed;
pub mod timedtext;

#[cfg(feature = "apify")]
pub mod apify;

pub use jsonld::HttpMarkupSource;
pub use oembed::HttpMetadataSource;
pub use timedtext::HttpTranscriptSource;

#[cfg(feature = "apify")]
pub use apify::ApifyCommentSource;

use std::sync::OnceLock;

/// Basic HTML entity decoding for scraped text.
pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#34;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", " ")
}

/// Extract the content of a `<meta property|name="..." content="...">` tag.
pub(crate) fn meta_content(html: &str, key: &str) -> Option<String> {
    // Attribute order varies between sites; try both arrangements
    let patterns = [
        format!(
            r#"<meta[^>]*(?:property|name)\s*=\s*["']{}["'][^>]*content\s*=\s*["']([^"']*)["']"#,
            regex::escape(key)
        ),
        format!(
            r#"<meta[^>]*content\s*=\s*["']([^"']*)["'][^>]*(?:property|name)\s*=\s*["']{}["']"#,
            regex::escape(key)
        ),
    ];

    for pattern in &patterns {
        if let Ok(re) = regex::Regex::new(pattern) {
            if let Some(captures) = re.captures(html) {
                let content = decode_entities(&captures[1]);
                if !content.trim().is_empty() {
                    return Some(content.trim().to_string());
                }
            }
        }
    }
    None
}

/// Extract the `<title>` tag content.
pub(crate) fn title_tag(html: &str) -> Option<String> {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = RE.get_or_init(|| regex::Regex::new(r"(?s)<title[^>]*>(.*?)</title>").unwrap());
    re.captures(html)
        .map(|c| decode_entities(c[1].trim()))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_content_both_attribute_orders() {
        let html = r#"<meta property="og:title" content="Best Pasta" />
                      <meta content="A cozy recipe" name="description">"#;
        assert_eq!(meta_content(html, "og:title"), Some("Best Pasta".into()));
        assert_eq!(meta_content(html, "description"), Some("A cozy recipe".into()));
        assert_eq!(meta_content(html, "og:video"), None);
    }

    #[test]
    fn test_title_tag_and_entities() {
        let html = "<html><head><title>Mac &amp; Cheese</title></head></html>";
        assert_eq!(title_tag(html), Some("Mac & Cheese".into()));
    }
}

//! Metadata acquisition capability.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::platform::Platform;
use crate::types::metadata::PostMetadata;

/// Fetches title, description, thumbnail, duration, and creator identity
/// for a post URL.
///
/// Implementations try source-specific methods in priority order (oEmbed
/// endpoints, then a generic Open Graph scrape). Partial results are
/// normal; every field of [`PostMetadata`] except the URL is optional.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn fetch(&self, url: &str, platform: Platform) -> FetchResult<PostMetadata>;

    /// Name for logging and telemetry.
    fn name(&self) -> &str {
        "metadata"
    }
}

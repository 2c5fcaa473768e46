//! Caption/transcript fetch capability.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::platform::Platform;
use crate::types::metadata::Transcript;

/// Fetches an existing caption track for a video.
///
/// Returns `Ok(None)` when the platform has no captions for the post;
/// this is an expected empty result, not an error.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    async fn fetch_transcript(
        &self,
        url: &str,
        platform: Platform,
    ) -> FetchResult<Option<Transcript>>;
}

/// A transcript source for deployments without a caption provider.
pub struct NullTranscriptSource;

#[async_trait]
impl TranscriptSource for NullTranscriptSource {
    async fn fetch_transcript(
        &self,
        _url: &str,
        _platform: Platform,
    ) -> FetchResult<Option<Transcript>> {
        Ok(None)
    }
}

//! Comment harvesting capability.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::platform::Platform;
use crate::types::metadata::Comment;

/// Harvests ranked comments for a post.
///
/// Only available for some platforms; callers check [`supports`] before
/// harvesting. Results are ordered by the provider's own ranking (usually
/// vote count).
///
/// [`supports`]: CommentSource::supports
#[async_trait]
pub trait CommentSource: Send + Sync {
    fn supports(&self, platform: Platform) -> bool;

    async fn harvest(
        &self,
        url: &str,
        platform: Platform,
        limit: u32,
    ) -> FetchResult<Vec<Comment>>;
}

/// A comment source for deployments without a harvesting provider.
pub struct NullCommentSource;

#[async_trait]
impl CommentSource for NullCommentSource {
    fn supports(&self, _platform: Platform) -> bool {
        false
    }

    async fn harvest(
        &self,
        _url: &str,
        platform: Platform,
        _limit: u32,
    ) -> FetchResult<Vec<Comment>> {
        Err(crate::error::FetchError::UnsupportedPlatform {
            platform: platform.to_string(),
        })
    }
}

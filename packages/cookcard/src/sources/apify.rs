//! Comment harvesting via Apify comment-scraper actors.

use async_trait::async_trait;

use apify_client::ApifyClient;

use crate::error::{FetchError, FetchResult};
use crate::platform::Platform;
use crate::traits::comments::CommentSource;
use crate::types::metadata::Comment;

/// [`CommentSource`] backed by Apify's comment-scraper actors.
///
/// The ladder only harvests for the YouTube family; the Instagram actor
/// binding is kept for deployments that widen the policy.
pub struct ApifyCommentSource {
    client: ApifyClient,
}

impl ApifyCommentSource {
    pub fn new(token: String) -> Self {
        Self {
            client: ApifyClient::new(token),
        }
    }
}

#[async_trait]
impl CommentSource for ApifyCommentSource {
    fn supports(&self, platform: Platform) -> bool {
        matches!(platform, Platform::YouTube | Platform::Instagram)
    }

    async fn harvest(
        &self,
        url: &str,
        platform: Platform,
        limit: u32,
    ) -> FetchResult<Vec<Comment>> {
        match platform {
            Platform::YouTube => {
                let comments = self
                    .client
                    .scrape_youtube_comments(url, limit)
                    .await
                    .map_err(|e| FetchError::Http(Box::new(e)))?;
                Ok(comments
                    .into_iter()
                    .filter_map(|c| {
                        let text = c.text?;
                        Some(Comment {
                            text,
                            author: c.author,
                            like_count: c.vote_count.unwrap_or(0),
                            posted_at: c.published_at,
                        })
                    })
                    .collect())
            }
            Platform::Instagram => {
                let comments = self
                    .client
                    .scrape_instagram_comments(url, limit)
                    .await
                    .map_err(|e| FetchError::Http(Box::new(e)))?;
                Ok(comments
                    .into_iter()
                    .filter_map(|c| {
                        let text = c.text?;
                        Some(Comment {
                            text,
                            author: c.owner_username,
                            like_count: c.likes_count.unwrap_or(0),
                            posted_at: c.timestamp,
                        })
                    })
                    .collect())
            }
            other => Err(FetchError::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }
}

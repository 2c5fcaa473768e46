//! Pure Apify REST API client.
//!
//! A minimal client for the Apify platform API. Supports starting actor
//! runs, polling for completion, and fetching dataset results, with
//! convenience wrappers for the comment-scraper actors.
//!
//! # Example
//!
//! ```rust,ignore
//! use apify_client::ApifyClient;
//!
//! let client = ApifyClient::new("your-api-token".into());
//!
//! let comments = client
//!     .scrape_youtube_comments("https://youtube.com/watch?v=abc", 30)
//!     .await?;
//! for comment in &comments {
//!     println!("{}", comment.text.as_deref().unwrap_or("(empty)"));
//! }
//! ```

pub mod error;
pub mod types;

pub use error::{ApifyError, Result};
pub use types::{
    InstagramComment, InstagramCommentsInput, RunData, StartUrl, YouTubeComment,
    YouTubeCommentsInput,
};

use serde::de::DeserializeOwned;
use serde::Serialize;
use types::ApiResponse;

const BASE_URL: &str = "https://api.apify.com/v2";

/// Actor slug for streamers/youtube-comments-scraper.
const YOUTUBE_COMMENTS_SCRAPER: &str = "streamers~youtube-comments-scraper";

/// Actor slug for apify/instagram-comment-scraper.
const INSTAGRAM_COMMENT_SCRAPER: &str = "apify~instagram-comment-scraper";

pub struct ApifyClient {
    client: reqwest::Client,
    token: String,
}

impl ApifyClient {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }

    /// Start an actor run. Returns immediately with run metadata.
    pub async fn start_run<I: Serialize>(&self, actor: &str, input: &I) -> Result<RunData> {
        let url = format!("{BASE_URL}/acts/{actor}/runs");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(input)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let api_resp: ApiResponse<RunData> = resp.json().await?;
        Ok(api_resp.data)
    }

    /// Poll until a run completes. Uses `waitForFinish=60` for efficient
    /// long-polling.
    pub async fn wait_for_run(&self, run_id: &str) -> Result<RunData> {
        loop {
            let url = format!("{BASE_URL}/actor-runs/{run_id}?waitForFinish=60");
            let resp = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .send()
                .await?;

            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(ApifyError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let api_resp: ApiResponse<RunData> = resp.json().await?;
            match api_resp.data.status.as_str() {
                "SUCCEEDED" => return Ok(api_resp.data),
                "FAILED" | "ABORTED" | "TIMED-OUT" => {
                    return Err(ApifyError::RunFailed(api_resp.data.status));
                }
                _ => {
                    tracing::debug!(run_id, status = %api_resp.data.status, "Run still in progress");
                    continue;
                }
            }
        }
    }

    /// Fetch dataset items from a completed run.
    pub async fn get_dataset_items<T: DeserializeOwned>(
        &self,
        dataset_id: &str,
    ) -> Result<Vec<T>> {
        let url = format!("{BASE_URL}/datasets/{dataset_id}/items?format=json");
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApifyError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let items: Vec<T> = resp.json().await?;
        Ok(items)
    }

    /// Run an actor end-to-end: start, poll, fetch results.
    async fn run_actor<I: Serialize, T: DeserializeOwned>(
        &self,
        actor: &str,
        input: &I,
    ) -> Result<Vec<T>> {
        let run = self.start_run(actor, input).await?;
        tracing::info!(actor, run_id = %run.id, "Apify run started, polling for completion");

        let completed = self.wait_for_run(&run.id).await?;
        tracing::info!(
            run_id = %completed.id,
            dataset_id = %completed.default_dataset_id,
            "Run completed, fetching results"
        );

        self.get_dataset_items(&completed.default_dataset_id).await
    }

    /// Scrape comments for a YouTube video end-to-end.
    pub async fn scrape_youtube_comments(
        &self,
        video_url: &str,
        limit: u32,
    ) -> Result<Vec<YouTubeComment>> {
        tracing::info!(video_url, limit, "Starting YouTube comment scrape");
        let input = YouTubeCommentsInput {
            start_urls: vec![StartUrl {
                url: video_url.to_string(),
            }],
            max_comments: limit,
        };
        let comments = self.run_actor(YOUTUBE_COMMENTS_SCRAPER, &input).await?;
        tracing::info!(count = comments.len(), "Fetched YouTube comments");
        Ok(comments)
    }

    /// Scrape comments for an Instagram post end-to-end.
    pub async fn scrape_instagram_comments(
        &self,
        post_url: &str,
        limit: u32,
    ) -> Result<Vec<InstagramComment>> {
        tracing::info!(post_url, limit, "Starting Instagram comment scrape");
        let input = InstagramCommentsInput {
            direct_urls: vec![post_url.to_string()],
            results_limit: limit,
        };
        let comments = self.run_actor(INSTAGRAM_COMMENT_SCRAPER, &input).await?;
        tracing::info!(count = comments.len(), "Fetched Instagram comments");
        Ok(comments)
    }
}

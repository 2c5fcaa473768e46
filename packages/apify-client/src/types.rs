//! Apify API request and response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input for the streamers/youtube-comments-scraper actor.
#[derive(Debug, Clone, Serialize)]
pub struct YouTubeCommentsInput {
    #[serde(rename = "startUrls")]
    pub start_urls: Vec<StartUrl>,
    #[serde(rename = "maxComments")]
    pub max_comments: u32,
}

/// Input for the apify/instagram-comment-scraper actor.
#[derive(Debug, Clone, Serialize)]
pub struct InstagramCommentsInput {
    #[serde(rename = "directUrls")]
    pub direct_urls: Vec<String>,
    #[serde(rename = "resultsLimit")]
    pub results_limit: u32,
}

/// A start URL entry as Apify actors expect it.
#[derive(Debug, Clone, Serialize)]
pub struct StartUrl {
    pub url: String,
}

/// A single YouTube comment from the Apify dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeComment {
    #[serde(alias = "comment")]
    pub text: Option<String>,
    pub author: Option<String>,
    #[serde(rename = "voteCount")]
    pub vote_count: Option<i64>,
    #[serde(rename = "publishedAt")]
    pub published_at: Option<DateTime<Utc>>,
}

/// A single Instagram comment from the Apify dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct InstagramComment {
    pub text: Option<String>,
    #[serde(rename = "ownerUsername")]
    pub owner_username: Option<String>,
    #[serde(rename = "likesCount")]
    pub likes_count: Option<i64>,
    pub timestamp: Option<DateTime<Utc>>,
}

/// Wrapper for Apify API responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Apify actor run metadata.
#[derive(Debug, Clone, Deserialize)]
pub struct RunData {
    pub id: String,
    pub status: String,
    #[serde(rename = "defaultDatasetId")]
    pub default_dataset_id: String,
    #[serde(rename = "startedAt")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(rename = "finishedAt")]
    pub finished_at: Option<DateTime<Utc>>,
}

//! Acquisition-side types: post metadata, comments, markup, transcripts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::platform::Platform;
use crate::types::card::Creator;

/// Metadata for a post URL, as acquired from the source platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMetadata {
    pub url: String,
    pub platform: Platform,
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,

    /// Video length; `None` for image posts and pages, or when the
    /// platform did not report it
    pub duration_seconds: Option<u32>,

    pub creator: Option<Creator>,

    /// Direct media URL when the platform exposes one (needed for ASR)
    pub media_url: Option<String>,
}

impl PostMetadata {
    pub fn new(url: impl Into<String>, platform: Platform) -> Self {
        Self {
            url: url.into(),
            platform,
            title: None,
            description: None,
            thumbnail_url: None,
            duration_seconds: None,
            creator: None,
            media_url: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_creator(mut self, creator: Creator) -> Self {
        self.creator = Some(creator);
        self
    }

    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    pub fn with_media_url(mut self, url: impl Into<String>) -> Self {
        self.media_url = Some(url.into());
        self
    }
}

/// A harvested comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    pub author: Option<String>,

    /// Platform vote/like count, used as a ranking prior
    #[serde(default)]
    pub like_count: i64,

    pub posted_at: Option<DateTime<Utc>>,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: None,
            like_count: 0,
            posted_at: None,
        }
    }
}

/// Machine-readable recipe markup read from a webpage (schema.org Recipe).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuredRecipe {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub author: Option<String>,

    /// Ingredient lines exactly as authored
    pub ingredients: Vec<String>,

    /// Instruction steps exactly as authored
    pub instructions: Vec<String>,

    pub prep_time_minutes: Option<u32>,
    pub cook_time_minutes: Option<u32>,
    pub total_time_minutes: Option<u32>,
    pub servings: Option<String>,
}

/// A caption/transcript for a video.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub language: Option<String>,
}

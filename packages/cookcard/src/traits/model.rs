//! Model capabilities: text extraction, vision extraction, and ASR.
//!
//! The model is a proposer, never a gate: everything it returns is
//! validated downstream (evidence check, header filter, cross-source
//! merge) before entering a card.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::platform::Platform;

/// A candidate ingredient proposed by a model, before validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateIngredient {
    pub name: String,
    pub amount: Option<f32>,
    pub unit: Option<String>,
    pub preparation: Option<String>,
    #[serde(default)]
    pub is_optional: bool,

    /// Literal substring of the source text supporting this ingredient.
    /// Candidates without one are rejected for text-derived extractions.
    pub evidence_phrase: Option<String>,

    /// Model's own confidence in [0, 1]
    pub confidence: f32,
}

impl CandidateIngredient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: None,
            unit: None,
            preparation: None,
            is_optional: false,
            evidence_phrase: None,
            confidence: 0.5,
        }
    }

    pub fn with_evidence(mut self, phrase: impl Into<String>) -> Self {
        self.evidence_phrase = Some(phrase.into());
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_amount(mut self, amount: f32, unit: Option<&str>) -> Self {
        self.amount = Some(amount);
        self.unit = unit.map(String::from);
        self
    }
}

/// Result of a text-to-recipe model call.
#[derive(Debug, Clone, Default)]
pub struct TextExtraction {
    pub ingredients: Vec<CandidateIngredient>,
    pub steps: Vec<String>,
    pub confidence: f32,
    pub cost_cents: u32,
}

/// Result of a vision model call over video content.
#[derive(Debug, Clone, Default)]
pub struct VisionExtraction {
    pub ingredients: Vec<CandidateIngredient>,
    pub steps: Vec<String>,
    pub confidence: f32,
    pub cost_cents: u32,
}

/// Result of a speech-to-text call.
#[derive(Debug, Clone)]
pub struct AsrTranscript {
    pub text: String,
    pub cost_cents: u32,
}

/// What the vision stage is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionTarget {
    /// Full extraction: ingredients and instruction steps in one call
    IngredientsAndSteps,
    /// Instructions only; ingredients were already extracted elsewhere
    StepsOnly,
}

/// Reference to the video content of a post.
#[derive(Debug, Clone)]
pub struct VideoRef {
    pub url: String,
    pub platform: Platform,
    pub duration_seconds: u32,
    pub thumbnail_url: Option<String>,
    pub media_url: Option<String>,
}

impl VideoRef {
    /// Whole minutes billed for vision work on this video.
    pub fn billed_minutes(&self) -> u32 {
        self.duration_seconds.div_ceil(60).max(1)
    }
}

/// Model capabilities consumed by the ladder.
#[async_trait]
pub trait RecipeModel: Send + Sync {
    /// Parse ingredients and instruction steps from natural-language
    /// source text. Every returned ingredient must cite an evidence
    /// phrase quoted from the text.
    async fn extract_from_text(
        &self,
        title: &str,
        text: &str,
        platform: Platform,
    ) -> Result<TextExtraction>;

    /// Extract ingredients and/or instructions directly from video
    /// content (visual and audio).
    async fn extract_from_video(
        &self,
        video: &VideoRef,
        title: &str,
        target: VisionTarget,
    ) -> Result<VisionExtraction>;

    /// Transcribe the audio track of a video.
    async fn transcribe(&self, video: &VideoRef) -> Result<AsrTranscript>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billed_minutes_rounds_up() {
        let mut video = VideoRef {
            url: "https://example.com/v".into(),
            platform: Platform::TikTok,
            duration_seconds: 61,
            thumbnail_url: None,
            media_url: None,
        };
        assert_eq!(video.billed_minutes(), 2);

        video.duration_seconds = 60;
        assert_eq!(video.billed_minutes(), 1);

        // Zero-length metadata still bills a minimum of one minute
        video.duration_seconds = 0;
        assert_eq!(video.billed_minutes(), 1);
    }
}

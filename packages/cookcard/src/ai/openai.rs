//! OpenAI implementation of the RecipeModel trait.
//!
//! Text extraction and vision use chat completions with strict structured
//! outputs; ASR uses the audio transcriptions endpoint. Prompts demand a
//! literal `evidence_phrase` per ingredient so the evidence validator has
//! something to hold the model to.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;

use openai_client::{ContentPart, OpenAIClient, Usage};

use crate::error::{ExtractionError, Result};
use crate::platform::Platform;
use crate::traits::model::{
    AsrTranscript, CandidateIngredient, RecipeModel, TextExtraction, VideoRef, VisionExtraction,
    VisionTarget,
};

const TEXT_SYSTEM_PROMPT: &str = "You extract recipes from social media text. \
Return every ingredient you can find, each with an evidence_phrase that is an \
EXACT VERBATIM substring of the provided text mentioning that ingredient - never \
paraphrase it. Do not invent ingredients that are not in the text. Extract \
numbered instruction steps when the text contains them. Set confidence per \
ingredient between 0 and 1.";

const VISION_SYSTEM_PROMPT: &str = "You extract recipes from cooking videos. \
You are given the video's title, duration, and a representative frame. List \
only ingredients you can actually identify from what you see; do not guess a \
generic recipe from the title alone. Set confidence per ingredient between 0 \
and 1, lower when the frame is ambiguous.";

const STEPS_ONLY_PROMPT: &str = "You extract cooking instructions from videos. \
The ingredient list is already known; return ONLY the ordered instruction \
steps you can infer from the video frame and title. Leave ingredients empty.";

/// Structured output shape shared by text and vision extraction.
#[derive(Debug, Deserialize, JsonSchema)]
struct ModelRecipe {
    ingredients: Vec<ModelIngredient>,
    steps: Vec<String>,
    /// Overall extraction confidence in [0, 1]
    confidence: f32,
}

#[derive(Debug, Deserialize, JsonSchema)]
struct ModelIngredient {
    name: String,
    amount: Option<f32>,
    unit: Option<String>,
    preparation: Option<String>,
    is_optional: Option<bool>,
    /// Exact verbatim quote from the source text
    evidence_phrase: Option<String>,
    confidence: Option<f32>,
}

impl ModelIngredient {
    fn into_candidate(self, default_confidence: f32) -> CandidateIngredient {
        CandidateIngredient {
            name: self.name,
            amount: self.amount,
            unit: self.unit,
            preparation: self.preparation,
            is_optional: self.is_optional.unwrap_or(false),
            evidence_phrase: self.evidence_phrase,
            confidence: self
                .confidence
                .unwrap_or(default_confidence)
                .clamp(0.0, 1.0),
        }
    }
}

/// USD per million tokens: (input, output).
fn price_per_million(model: &str) -> (f64, f64) {
    if model.contains("mini") {
        (0.15, 0.60)
    } else {
        (2.50, 10.00)
    }
}

/// Whisper pricing is per audio minute.
const ASR_CENTS_PER_MINUTE: f64 = 0.6;

fn chat_cost_cents(model: &str, usage: &Usage) -> u32 {
    let (input, output) = price_per_million(model);
    let dollars = f64::from(usage.prompt_tokens) * input / 1_000_000.0
        + f64::from(usage.completion_tokens) * output / 1_000_000.0;
    (dollars * 100.0).ceil() as u32
}

/// RecipeModel over the OpenAI API.
pub struct OpenAiRecipeModel {
    client: OpenAIClient,
    media_client: reqwest::Client,
    text_model: String,
    vision_model: String,
    asr_model: String,
}

impl OpenAiRecipeModel {
    pub fn new(client: OpenAIClient) -> Self {
        Self {
            client,
            media_client: reqwest::Client::new(),
            text_model: "gpt-4o-mini".to_string(),
            vision_model: "gpt-4o".to_string(),
            asr_model: "whisper-1".to_string(),
        }
    }

    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    pub fn with_vision_model(mut self, model: impl Into<String>) -> Self {
        self.vision_model = model.into();
        self
    }

    fn map_err(e: openai_client::OpenAIError) -> ExtractionError {
        ExtractionError::Model(Box::new(e))
    }
}

#[async_trait]
impl RecipeModel for OpenAiRecipeModel {
    async fn extract_from_text(
        &self,
        title: &str,
        text: &str,
        platform: Platform,
    ) -> Result<TextExtraction> {
        let user = format!("Platform: {platform}\nTitle: {title}\n\nText:\n{text}");
        let (recipe, usage): (ModelRecipe, Usage) = self
            .client
            .extract(&self.text_model, TEXT_SYSTEM_PROMPT, &user)
            .await
            .map_err(Self::map_err)?;

        let confidence = recipe.confidence.clamp(0.0, 1.0);
        Ok(TextExtraction {
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(|i| i.into_candidate(confidence))
                .collect(),
            steps: recipe.steps,
            confidence,
            cost_cents: chat_cost_cents(&self.text_model, &usage),
        })
    }

    async fn extract_from_video(
        &self,
        video: &VideoRef,
        title: &str,
        target: VisionTarget,
    ) -> Result<VisionExtraction> {
        let system = match target {
            VisionTarget::IngredientsAndSteps => VISION_SYSTEM_PROMPT,
            VisionTarget::StepsOnly => STEPS_ONLY_PROMPT,
        };

        let mut parts = vec![ContentPart::text(format!(
            "Platform: {}\nTitle: {title}\nDuration: {}s\nVideo: {}",
            video.platform, video.duration_seconds, video.url
        ))];
        if let Some(thumbnail) = &video.thumbnail_url {
            parts.push(ContentPart::image(thumbnail.clone()));
        }

        let (recipe, usage): (ModelRecipe, Usage) = self
            .client
            .extract_parts(&self.vision_model, system, parts)
            .await
            .map_err(Self::map_err)?;

        let confidence = recipe.confidence.clamp(0.0, 1.0);
        Ok(VisionExtraction {
            ingredients: recipe
                .ingredients
                .into_iter()
                .map(|i| i.into_candidate(confidence))
                .collect(),
            steps: recipe.steps,
            confidence,
            cost_cents: chat_cost_cents(&self.vision_model, &usage),
        })
    }

    async fn transcribe(&self, video: &VideoRef) -> Result<AsrTranscript> {
        let media_url = video.media_url.as_deref().ok_or_else(|| {
            ExtractionError::Model("no media URL available for transcription".into())
        })?;

        let response = self
            .media_client
            .get(media_url)
            .send()
            .await
            .map_err(|e| ExtractionError::Model(Box::new(e)))?;
        if !response.status().is_success() {
            return Err(ExtractionError::Model(
                format!("media fetch returned HTTP {}", response.status()).into(),
            ));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::Model(Box::new(e)))?;

        let transcription = self
            .client
            .transcribe(&self.asr_model, bytes.to_vec(), "audio.mp4")
            .await
            .map_err(Self::map_err)?;

        let minutes = f64::from(video.billed_minutes());
        Ok(AsrTranscript {
            text: transcription.text,
            cost_cents: (minutes * ASR_CENTS_PER_MINUTE).ceil() as u32,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_cost_rounds_up() {
        let usage = Usage {
            prompt_tokens: 1000,
            completion_tokens: 500,
            total_tokens: 1500,
        };
        // gpt-4o: 1000 * 2.5/1M + 500 * 10/1M dollars = 0.75 cents -> 1
        assert_eq!(chat_cost_cents("gpt-4o", &usage), 1);
        // mini is an order of magnitude cheaper but never free
        assert_eq!(chat_cost_cents("gpt-4o-mini", &usage), 1);
    }

    #[test]
    fn test_candidate_defaults() {
        let ingredient = ModelIngredient {
            name: "flour".into(),
            amount: None,
            unit: None,
            preparation: None,
            is_optional: None,
            evidence_phrase: Some("2 cups flour".into()),
            confidence: None,
        };
        let candidate = ingredient.into_candidate(0.7);
        assert_eq!(candidate.confidence, 0.7);
        assert!(!candidate.is_optional);
    }
}

//! Speech-to-text policy and extraction helper.
//!
//! ASR is the most expensive rung and runs last, only when everything
//! cheaper has left the card short of ingredients.

use std::time::Duration;

use crate::pipeline::context::LadderContext;
use crate::pipeline::evidence::validate_evidence;
use crate::pipeline::headers::filter_section_headers;
use crate::traits::model::{CandidateIngredient, VideoRef};
use crate::types::config::LadderConfig;

/// Should ASR run?
///
/// Policy: vision and the existing transcript together produced too few
/// ingredients, the video is short enough to transcribe affordably, and
/// the user's tier allows it.
pub fn should_run_asr(
    found_ingredients: usize,
    duration_seconds: u32,
    tier_allows: bool,
    config: &LadderConfig,
) -> bool {
    config.enable_asr
        && tier_allows
        && found_ingredients < config.min_ingredients
        && duration_seconds <= config.asr_max_duration_secs
}

/// Transcribe the video and extract evidence-validated candidates from
/// the ASR text. Returns `None` on any failure; the caller treats that
/// as "ASR contributed nothing".
pub(crate) async fn run_asr_extraction(
    ctx: &mut LadderContext,
    video: &VideoRef,
    title: &str,
) -> Option<Vec<CandidateIngredient>> {
    let transcribed = match tokio::time::timeout(
        Duration::from_secs(ctx.config.asr_timeout_secs),
        ctx.deps.model.transcribe(video),
    )
    .await
    {
        Ok(Ok(t)) => t,
        Ok(Err(e)) => {
            ctx.stage_failed("asr", e.to_string());
            return None;
        }
        Err(_) => {
            ctx.stage_failed("asr", "transcription timeout");
            return None;
        }
    };
    ctx.total_cost_cents += transcribed.cost_cents;

    if transcribed.text.trim().is_empty() {
        ctx.stage_failed("asr", "empty transcription");
        return None;
    }

    let extraction = match tokio::time::timeout(
        Duration::from_secs(ctx.config.model_timeout_secs),
        ctx.deps
            .model
            .extract_from_text(title, &transcribed.text, ctx.platform),
    )
    .await
    {
        Ok(Ok(extraction)) => extraction,
        Ok(Err(e)) => {
            ctx.stage_failed("asr", e.to_string());
            return None;
        }
        Err(_) => {
            ctx.stage_failed("asr", "extraction timeout");
            return None;
        }
    };
    ctx.total_cost_cents += extraction.cost_cents;

    // The ASR text is the evidence corpus for its own candidates
    let partition = validate_evidence(&transcribed.text, extraction.ingredients);
    let kept = filter_section_headers(partition.validated);
    if kept.is_empty() {
        None
    } else {
        Some(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asr_policy() {
        let config = LadderConfig::default();

        // Too few ingredients, short video, paying tier: run
        assert!(should_run_asr(1, 120, true, &config));

        // Enough ingredients already: skip
        assert!(!should_run_asr(3, 120, true, &config));

        // Video too long to transcribe: skip
        assert!(!should_run_asr(0, config.asr_max_duration_secs + 1, true, &config));

        // Free tier: skip
        assert!(!should_run_asr(0, 120, false, &config));

        // Globally disabled: skip
        let disabled = LadderConfig {
            enable_asr: false,
            ..LadderConfig::default()
        };
        assert!(!should_run_asr(0, 120, true, &disabled));
    }
}

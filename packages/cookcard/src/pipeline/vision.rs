//! Vision extraction stages.
//!
//! Two rungs share the vision capability:
//!
//! - [`VisionFirstStage`] - for short-form video, vision runs before the
//!   text ladder because one call yields both ingredients and
//!   instructions and short videos bill few minutes.
//! - [`VisionFallbackStage`] - the last resort when the ladder reaches
//!   the bottom with no ingredients at all; gated by the hard duration
//!   ceiling and cross-validated against transcript and ASR output.
//!
//! Both reserve budget before calling and release it on every path that
//! does not put vision content on the card.

use std::time::Duration;

use crate::budget::BudgetReservation;
use crate::pipeline::asr::{run_asr_extraction, should_run_asr};
use crate::pipeline::context::{LadderContext, Stage, StageOutcome};
use crate::pipeline::evidence::validate_evidence;
use crate::pipeline::headers::filter_section_headers;
use crate::pipeline::llm::candidates_to_ingredients;
use crate::pipeline::merge::{merge_sources, SourcedIngredients};
use crate::pipeline::text_ladder::best_comment;
use crate::telemetry::TelemetryEvent;
use crate::traits::model::{VideoRef, VisionExtraction, VisionTarget};
use crate::types::card::{
    EvidenceSource, ExtractionMethod, Instructions, Provenance,
};
use crate::types::outcome::FallbackKind;
use crate::platform::Platform;

/// Reserve vision minutes for a video, emitting telemetry either way.
fn reserve_minutes(ctx: &LadderContext, video: &VideoRef) -> Option<BudgetReservation> {
    let minutes = video.billed_minutes();
    match ctx.deps.budget.reserve(&ctx.request.user_id, minutes) {
        Ok(reservation) => {
            ctx.emit(TelemetryEvent::BudgetReserved {
                user_id: ctx.request.user_id.clone(),
                minutes,
            });
            Some(reservation)
        }
        Err(denied) => {
            ctx.emit(TelemetryEvent::BudgetDenied {
                user_id: ctx.request.user_id.clone(),
                reason: denied.to_string(),
            });
            None
        }
    }
}

/// Call the vision model with the configured timeout.
async fn call_vision(
    ctx: &mut LadderContext,
    video: &VideoRef,
    target: VisionTarget,
    stage: &'static str,
) -> Option<VisionExtraction> {
    let title = ctx.card.title.clone().unwrap_or_default();
    match tokio::time::timeout(
        Duration::from_secs(ctx.config.vision_timeout_secs),
        ctx.deps.model.extract_from_video(video, &title, target),
    )
    .await
    {
        Ok(Ok(extraction)) => {
            ctx.total_cost_cents += extraction.cost_cents;
            Some(extraction)
        }
        Ok(Err(e)) => {
            ctx.stage_failed(stage, e.to_string());
            None
        }
        Err(_) => {
            ctx.stage_failed(stage, "timeout");
            None
        }
    }
}

/// Vision-first routing for short-form video.
pub struct VisionFirstStage;

#[async_trait::async_trait]
impl Stage for VisionFirstStage {
    fn name(&self) -> &'static str {
        "vision_first"
    }

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome {
        if !ctx.config.enable_vision || !ctx.platform.is_video() {
            return StageOutcome::Continue;
        }
        let Some(video) = ctx.video_ref() else {
            return StageOutcome::Continue;
        };
        if video.duration_seconds > ctx.config.short_video_max_secs {
            return StageOutcome::Continue;
        }

        // Budget denial here is not terminal: the text ladder is cheaper
        // and still ahead of us.
        let Some(reservation) = reserve_minutes(ctx, &video) else {
            ctx.stage_failed(self.name(), "budget denied");
            return StageOutcome::Continue;
        };

        let Some(extraction) = call_vision(ctx, &video, VisionTarget::IngredientsAndSteps, self.name()).await
        else {
            // Reservation dropped here: released
            return StageOutcome::Continue;
        };

        let kept = filter_section_headers(extraction.ingredients.clone());
        if kept.len() < ctx.config.min_ingredients {
            ctx.stage_failed(
                self.name(),
                format!(
                    "insufficient ingredients ({} < {})",
                    kept.len(),
                    ctx.config.min_ingredients
                ),
            );
            // Keep the output for cross-source merging in the fallback
            // rung; the reservation is released by drop.
            ctx.vision_result = Some(extraction);
            return StageOutcome::Continue;
        }

        let minutes = reservation.minutes();
        reservation.commit();
        ctx.emit(TelemetryEvent::BudgetCommitted {
            user_id: ctx.request.user_id.clone(),
            minutes,
        });

        ctx.card.ingredients = candidates_to_ingredients(
            kept,
            Provenance::DetectedByModel,
            EvidenceSource::Vision,
            None,
        );
        if !extraction.steps.is_empty() {
            ctx.card.instructions = Instructions::from_steps(extraction.steps);
        }
        ctx.card.extraction.method = ExtractionMethod::Vision;
        ctx.card.extraction.evidence_source = Some(EvidenceSource::Vision);
        ctx.card.extraction.add_source(EvidenceSource::Vision);

        ctx.emit(TelemetryEvent::StageSucceeded {
            stage: self.name(),
            cost_cents: extraction.cost_cents,
        });
        StageOutcome::Complete
    }
}

/// Full vision/ASR fallback, reached only with an empty ingredient list.
pub struct VisionFallbackStage;

impl VisionFallbackStage {
    /// One last comment harvest for over-ceiling YouTube videos before
    /// rejecting them.
    async fn long_video_comment_rescue(&self, ctx: &mut LadderContext) -> Option<StageOutcome> {
        let harvest = ctx.deps.comments.harvest(
            &ctx.normalized_url,
            ctx.platform,
            ctx.config.comment_fetch_limit,
        );
        let comments = match tokio::time::timeout(
            Duration::from_secs(ctx.config.fetch_timeout_secs),
            harvest,
        )
        .await
        {
            Ok(Ok(comments)) => comments,
            _ => return None,
        };

        let (comment, score) = best_comment(&comments, ctx.config.comment_score_floor)?;
        let comment_text = comment.text.clone();

        let title = ctx.card.title.clone().unwrap_or_default();
        let extraction = match tokio::time::timeout(
            Duration::from_secs(ctx.config.model_timeout_secs),
            ctx.deps
                .model
                .extract_from_text(&title, &comment_text, ctx.platform),
        )
        .await
        {
            Ok(Ok(extraction)) => extraction,
            _ => return None,
        };
        ctx.total_cost_cents += extraction.cost_cents;

        let partition = validate_evidence(&comment_text, extraction.ingredients);
        let kept = filter_section_headers(partition.validated);
        if kept.len() < ctx.config.min_ingredients {
            return None;
        }

        ctx.card.ingredients = candidates_to_ingredients(
            kept,
            Provenance::CommentSourced,
            EvidenceSource::Comments,
            Some(score),
        );
        if !extraction.steps.is_empty() {
            ctx.card.instructions = Instructions::from_steps(extraction.steps);
        }
        ctx.card.extraction.method = ExtractionMethod::CommentText;
        ctx.card.extraction.evidence_source = Some(EvidenceSource::Comments);
        ctx.card.extraction.add_source(EvidenceSource::Comments);
        Some(StageOutcome::Complete)
    }

    /// Fetch the caption track now if the text ladder never did.
    async fn ensure_transcript(&self, ctx: &mut LadderContext) {
        if ctx.transcript.is_some() {
            return;
        }
        let fetch = ctx
            .deps
            .transcripts
            .fetch_transcript(&ctx.normalized_url, ctx.platform);
        if let Ok(Ok(Some(transcript))) = tokio::time::timeout(
            Duration::from_secs(ctx.config.fetch_timeout_secs),
            fetch,
        )
        .await
        {
            if !transcript.text.trim().is_empty() {
                ctx.transcript = Some(transcript.text);
            }
        }
    }
}

#[async_trait::async_trait]
impl Stage for VisionFallbackStage {
    fn name(&self) -> &'static str {
        "vision_fallback"
    }

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome {
        if !ctx.card.ingredients.is_empty() {
            return StageOutcome::Continue;
        }
        if !ctx.platform.is_video() || !ctx.config.enable_vision {
            return StageOutcome::Continue;
        }

        // Duration gates. Only video platforms reach here, and vision
        // cannot be priced without a known length.
        let Some(duration) = ctx.duration_seconds() else {
            return StageOutcome::Fallback {
                kind: FallbackKind::ManualEntry,
                reason: "video duration unknown".to_string(),
            };
        };
        if duration > ctx.config.hard_duration_ceiling_secs {
            if ctx.platform == Platform::YouTube && ctx.deps.comments.supports(ctx.platform) {
                if let Some(outcome) = self.long_video_comment_rescue(ctx).await {
                    return outcome;
                }
            }
            return StageOutcome::Fallback {
                kind: FallbackKind::ManualEntry,
                reason: format!(
                    "video too long ({duration}s > {}s), use manual entry",
                    ctx.config.hard_duration_ceiling_secs
                ),
            };
        }

        let Some(video) = ctx.video_ref() else {
            return StageOutcome::Fallback {
                kind: FallbackKind::ManualEntry,
                reason: "video duration unknown".to_string(),
            };
        };

        // At the bottom of the ladder a budget denial is terminal: there
        // is nothing cheaper left to try.
        let Some(reservation) = reserve_minutes(ctx, &video) else {
            return StageOutcome::Fallback {
                kind: FallbackKind::CookCardLite,
                reason: "vision budget exhausted".to_string(),
            };
        };

        // Reuse an insufficient vision-first result rather than paying
        // for the same frames twice.
        let vision = match ctx.vision_result.take() {
            Some(prior) => Some(prior),
            None => call_vision(ctx, &video, VisionTarget::IngredientsAndSteps, self.name()).await,
        };

        let vision_candidates = vision
            .as_ref()
            .map(|v| filter_section_headers(v.ingredients.clone()))
            .unwrap_or_default();

        // Transcript-derived list for cross-validation. Skip when the
        // text ladder already ran the model over this transcript.
        self.ensure_transcript(ctx).await;
        let mut transcript_candidates = Vec::new();
        if ctx.text_source != Some(EvidenceSource::Transcript) {
            if let Some(transcript_text) = ctx.transcript.clone() {
                let title = ctx.card.title.clone().unwrap_or_default();
                if let Ok(Ok(extraction)) = tokio::time::timeout(
                    Duration::from_secs(ctx.config.model_timeout_secs),
                    ctx.deps
                        .model
                        .extract_from_text(&title, &transcript_text, ctx.platform),
                )
                .await
                {
                    ctx.total_cost_cents += extraction.cost_cents;
                    let partition = validate_evidence(&transcript_text, extraction.ingredients);
                    transcript_candidates = filter_section_headers(partition.validated);
                }
            }
        }

        // ASR, policy-gated.
        let mut asr_candidates = Vec::new();
        let tier_allows = ctx
            .deps
            .quota
            .allows_asr(&ctx.request.user_id)
            .await
            .unwrap_or(false);
        let found_so_far = vision_candidates.len() + transcript_candidates.len();
        if should_run_asr(found_so_far, duration, tier_allows, &ctx.config) {
            let title = ctx.card.title.clone().unwrap_or_default();
            if let Some(candidates) = run_asr_extraction(ctx, &video, &title).await {
                asr_candidates = candidates;
            }
        }
        let asr_used = !asr_candidates.is_empty();

        let merged = merge_sources(vec![
            SourcedIngredients {
                source: EvidenceSource::Vision,
                ingredients: candidates_to_ingredients(
                    vision_candidates,
                    Provenance::DetectedByModel,
                    EvidenceSource::Vision,
                    None,
                ),
            },
            SourcedIngredients {
                source: EvidenceSource::Transcript,
                ingredients: candidates_to_ingredients(
                    transcript_candidates,
                    Provenance::DetectedByModel,
                    EvidenceSource::Transcript,
                    None,
                ),
            },
            SourcedIngredients {
                source: EvidenceSource::Asr,
                ingredients: candidates_to_ingredients(
                    asr_candidates,
                    Provenance::DetectedByModel,
                    EvidenceSource::Asr,
                    None,
                ),
            },
        ]);

        if merged.ingredients.is_empty() {
            // Reservation dropped: released
            ctx.stage_failed(self.name(), "no source yielded ingredients");
            return StageOutcome::Continue;
        }

        let vision_contributed = merged.sources_used.contains(&EvidenceSource::Vision);
        if vision_contributed {
            let minutes = reservation.minutes();
            reservation.commit();
            ctx.emit(TelemetryEvent::BudgetCommitted {
                user_id: ctx.request.user_id.clone(),
                minutes,
            });
        } else {
            drop(reservation);
        }

        ctx.card.ingredients = merged.ingredients;
        ctx.card.extraction.conflicts = merged.conflicts;
        for source in &merged.sources_used {
            ctx.card.extraction.add_source(*source);
        }
        ctx.card.extraction.method = if asr_used {
            ExtractionMethod::VisionAsr
        } else if vision_contributed {
            ExtractionMethod::Vision
        } else {
            ExtractionMethod::LlmText
        };
        ctx.card.extraction.evidence_source = merged.sources_used.first().copied();

        if !ctx.card.has_steps() {
            if let Some(steps) = vision.as_ref().filter(|v| !v.steps.is_empty()) {
                ctx.card.instructions = Instructions::from_steps(steps.steps.clone());
            }
        }

        ctx.emit(TelemetryEvent::StageSucceeded {
            stage: self.name(),
            cost_cents: 0,
        });

        if ctx.card.ingredients.len() >= ctx.config.min_ingredients {
            StageOutcome::Complete
        } else {
            // Partial result: keep it on the card and let the orchestrator
            // close out with a fallback marker.
            StageOutcome::Continue
        }
    }
}

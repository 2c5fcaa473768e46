//! Instruction backfill.
//!
//! Runs when the card has enough ingredients but no instruction steps:
//! first a model pass over the caption track, then - because the
//! ingredients are already paid for - a vision call asking for steps
//! only.

use std::time::Duration;

use crate::pipeline::context::{LadderContext, Stage, StageOutcome};
use crate::telemetry::TelemetryEvent;
use crate::traits::model::VisionTarget;
use crate::types::card::{EvidenceSource, Instructions};

pub struct InstructionBackfillStage;

impl InstructionBackfillStage {
    /// Try to pull steps out of the caption track.
    async fn transcript_steps(&self, ctx: &mut LadderContext) -> Option<Vec<String>> {
        if ctx.transcript.is_none() {
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
        let transcript_text = ctx.transcript.clone()?;

        let title = ctx.card.title.clone().unwrap_or_default();
        let extraction = match tokio::time::timeout(
            Duration::from_secs(ctx.config.model_timeout_secs),
            ctx.deps
                .model
                .extract_from_text(&title, &transcript_text, ctx.platform),
        )
        .await
        {
            Ok(Ok(extraction)) => extraction,
            Ok(Err(e)) => {
                ctx.stage_failed("instruction_backfill", e.to_string());
                return None;
            }
            Err(_) => {
                ctx.stage_failed("instruction_backfill", "transcript model timeout");
                return None;
            }
        };
        ctx.total_cost_cents += extraction.cost_cents;

        if extraction.steps.is_empty() {
            None
        } else {
            Some(extraction.steps)
        }
    }

    /// Ask vision for steps only, reusing the ingredients we already have.
    async fn vision_steps(&self, ctx: &mut LadderContext) -> Option<Vec<String>> {
        if !ctx.config.enable_vision {
            return None;
        }
        let video = ctx.video_ref()?;
        if video.duration_seconds > ctx.config.hard_duration_ceiling_secs {
            return None;
        }

        let minutes = video.billed_minutes();
        let reservation = match ctx.deps.budget.reserve(&ctx.request.user_id, minutes) {
            Ok(reservation) => {
                ctx.emit(TelemetryEvent::BudgetReserved {
                    user_id: ctx.request.user_id.clone(),
                    minutes,
                });
                reservation
            }
            Err(denied) => {
                ctx.emit(TelemetryEvent::BudgetDenied {
                    user_id: ctx.request.user_id.clone(),
                    reason: denied.to_string(),
                });
                return None;
            }
        };

        let title = ctx.card.title.clone().unwrap_or_default();
        let extraction = match tokio::time::timeout(
            Duration::from_secs(ctx.config.vision_timeout_secs),
            ctx.deps
                .model
                .extract_from_video(&video, &title, VisionTarget::StepsOnly),
        )
        .await
        {
            Ok(Ok(extraction)) => extraction,
            Ok(Err(e)) => {
                ctx.stage_failed("instruction_backfill", e.to_string());
                return None;
            }
            Err(_) => {
                ctx.stage_failed("instruction_backfill", "vision timeout");
                return None;
            }
        };
        ctx.total_cost_cents += extraction.cost_cents;

        if extraction.steps.is_empty() {
            // Reservation dropped: released
            return None;
        }

        reservation.commit();
        ctx.emit(TelemetryEvent::BudgetCommitted {
            user_id: ctx.request.user_id.clone(),
            minutes,
        });
        ctx.card.extraction.add_source(EvidenceSource::Vision);
        Some(extraction.steps)
    }
}

#[async_trait::async_trait]
impl Stage for InstructionBackfillStage {
    fn name(&self) -> &'static str {
        "instruction_backfill"
    }

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome {
        let has_ingredients = ctx.card.ingredients.len() >= ctx.config.min_ingredients;
        if !has_ingredients || ctx.card.has_steps() || !ctx.platform.is_video() {
            return StageOutcome::Continue;
        }

        if let Some(steps) = self.transcript_steps(ctx).await {
            ctx.card.instructions = Instructions::from_steps(steps);
            ctx.card.extraction.add_source(EvidenceSource::Transcript);
            ctx.emit(TelemetryEvent::StageSucceeded {
                stage: self.name(),
                cost_cents: 0,
            });
            return StageOutcome::Complete;
        }

        if let Some(steps) = self.vision_steps(ctx).await {
            ctx.card.instructions = Instructions::from_steps(steps);
            ctx.emit(TelemetryEvent::StageSucceeded {
                stage: self.name(),
                cost_cents: 0,
            });
            return StageOutcome::Complete;
        }

        StageOutcome::Continue
    }
}

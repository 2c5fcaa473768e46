//! Language-model extraction stage.
//!
//! Turns assembled source text into candidate ingredients and steps,
//! then runs the evidence validator and section-header filter before
//! anything reaches the card. The quality gate runs first so obviously
//! recipe-free text never costs a model call.

use std::time::Duration;

use crate::pipeline::context::{LadderContext, Stage, StageOutcome};
use crate::pipeline::evidence::validate_evidence;
use crate::pipeline::headers::filter_section_headers;
use crate::pipeline::signals::has_recipe_signals;
use crate::telemetry::TelemetryEvent;
use crate::traits::model::CandidateIngredient;
use crate::types::card::{EvidenceSource, ExtractionMethod, Ingredient, Instructions, Provenance};

/// Map validated candidates onto card ingredients.
pub(crate) fn candidates_to_ingredients(
    candidates: Vec<CandidateIngredient>,
    provenance: Provenance,
    evidence_source: EvidenceSource,
    comment_score: Option<i32>,
) -> Vec<Ingredient> {
    candidates
        .into_iter()
        .map(|c| {
            let mut ingredient =
                Ingredient::new(c.name, provenance).with_confidence(c.confidence);
            ingredient.amount = c.amount;
            ingredient.unit = c.unit;
            ingredient.preparation = c.preparation;
            ingredient.is_optional = c.is_optional;
            ingredient.evidence_phrase = c.evidence_phrase;
            ingredient.evidence_source = Some(evidence_source);
            ingredient.comment_score = comment_score;
            ingredient
        })
        .collect()
}

pub struct LlmStage;

#[async_trait::async_trait]
impl Stage for LlmStage {
    fn name(&self) -> &'static str {
        "llm_extraction"
    }

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome {
        let Some(text) = ctx.source_text.clone() else {
            ctx.stage_failed(self.name(), "no source text");
            return StageOutcome::Continue;
        };

        // Cost control: skip the call entirely when the text carries no
        // recipe signals. A controlled failure, not an error.
        if !has_recipe_signals(&text) {
            ctx.stage_failed(self.name(), "no recipe signals in text");
            return StageOutcome::Continue;
        }

        let title = ctx.card.title.clone().unwrap_or_default();
        let call = ctx.deps.model.extract_from_text(&title, &text, ctx.platform);
        let extraction = match tokio::time::timeout(
            Duration::from_secs(ctx.config.model_timeout_secs),
            call,
        )
        .await
        {
            Ok(Ok(extraction)) => extraction,
            Ok(Err(e)) => {
                ctx.stage_failed(self.name(), e.to_string());
                return StageOutcome::Continue;
            }
            Err(_) => {
                ctx.stage_failed(self.name(), "timeout");
                return StageOutcome::Continue;
            }
        };

        ctx.total_cost_cents += extraction.cost_cents;

        let partition = validate_evidence(&text, extraction.ingredients);
        if !partition.rejected.is_empty() {
            tracing::debug!(
                rejected = partition.rejected.len(),
                "dropped ingredients with unverifiable evidence"
            );
        }
        let kept = filter_section_headers(partition.validated);

        if kept.is_empty() {
            ctx.stage_failed(self.name(), "no ingredients survived validation");
            return StageOutcome::Continue;
        }

        let text_source = ctx.text_source.unwrap_or(EvidenceSource::Description);
        let from_comment = text_source == EvidenceSource::Comments;
        let provenance = if from_comment {
            Provenance::CommentSourced
        } else {
            Provenance::DetectedByModel
        };

        ctx.card.ingredients =
            candidates_to_ingredients(kept, provenance, text_source, ctx.comment_score);
        if !extraction.steps.is_empty() {
            ctx.card.instructions = Instructions::from_steps(extraction.steps);
        }
        ctx.card.extraction.method = if from_comment {
            ExtractionMethod::CommentText
        } else {
            ExtractionMethod::LlmText
        };
        ctx.card.extraction.evidence_source = Some(text_source);
        ctx.card.extraction.add_source(text_source);

        ctx.emit(TelemetryEvent::StageSucceeded {
            stage: self.name(),
            cost_cents: extraction.cost_cents,
        });
        StageOutcome::Continue
    }
}

/// Early-return check after text extraction.
///
/// With enough validated ingredients, and instructions present or not
/// expected (non-video platforms), the expensive vision stages are
/// skipped entirely.
pub struct EarlyReturnStage;

#[async_trait::async_trait]
impl Stage for EarlyReturnStage {
    fn name(&self) -> &'static str {
        "early_return"
    }

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome {
        let enough = ctx.card.ingredients.len() >= ctx.config.min_ingredients;
        let instructions_ok = ctx.card.has_steps() || !ctx.platform.is_video();

        if enough && instructions_ok {
            StageOutcome::Complete
        } else {
            StageOutcome::Continue
        }
    }
}

//! Structured-data fast path.
//!
//! Non-social domains usually mean recipe blogs, and recipe blogs carry
//! schema.org markup. When that markup passes the quality gates the whole
//! ladder is bypassed: terminal success, cost 0, fixed high confidence.

use std::time::Duration;

use crate::pipeline::context::{LadderContext, Stage, StageOutcome};
use crate::pipeline::signals::count_real_ingredients;
use crate::types::card::{
    EvidenceSource, ExtractionMethod, Ingredient, Instructions, Provenance,
};
use crate::types::config::LadderConfig;
use crate::types::metadata::StructuredRecipe;

/// Do the markup's contents pass the fast-path quality gates?
///
/// Creators sometimes publish markup whose ingredient list is "see
/// video"-style filler; the gates require a minimum number of lines that
/// look like actual ingredients and instructions of non-trivial length.
pub fn markup_passes_gates(recipe: &StructuredRecipe, config: &LadderConfig) -> bool {
    let real_ingredients = count_real_ingredients(&recipe.ingredients);
    if real_ingredients < config.min_ingredients {
        return false;
    }

    let instruction_len: usize = recipe.instructions.iter().map(|s| s.trim().len()).sum();
    instruction_len > config.min_instruction_chars
}

/// Fill the card from creator-authored structured markup.
pub(crate) fn apply_structured_recipe(
    ctx: &mut LadderContext,
    recipe: &StructuredRecipe,
    evidence_source: EvidenceSource,
    method: ExtractionMethod,
) {
    let confidence = ctx.config.schema_org_confidence;

    if recipe.title.is_some() {
        ctx.card.title = recipe.title.clone();
    }
    if recipe.description.is_some() {
        ctx.card.description = recipe.description.clone();
    }
    if recipe.image_url.is_some() {
        ctx.card.image_url = recipe.image_url.clone();
    }
    ctx.card.prep_time_minutes = recipe.prep_time_minutes;
    ctx.card.cook_time_minutes = recipe.cook_time_minutes;
    ctx.card.total_time_minutes = recipe.total_time_minutes;
    ctx.card.servings = recipe.servings.clone();

    ctx.card.ingredients = recipe
        .ingredients
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut ingredient = Ingredient::new(line.trim(), Provenance::CreatorStructured)
                .with_confidence(confidence);
            ingredient.evidence_source = Some(evidence_source);
            ingredient
        })
        .collect();

    ctx.card.instructions = Instructions::from_steps(
        recipe
            .instructions
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty()),
    );

    ctx.card.extraction.method = method;
    ctx.card.extraction.evidence_source = Some(evidence_source);
    ctx.card.extraction.add_source(evidence_source);
}

pub struct SchemaOrgStage;

#[async_trait::async_trait]
impl Stage for SchemaOrgStage {
    fn name(&self) -> &'static str {
        "schema_org"
    }

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome {
        if !ctx.config.enable_schema_fast_path || ctx.platform.is_social() {
            return StageOutcome::Continue;
        }

        let fetch = ctx.deps.markup.recipe_markup(&ctx.normalized_url);
        let recipe = match tokio::time::timeout(
            Duration::from_secs(ctx.config.fetch_timeout_secs),
            fetch,
        )
        .await
        {
            Ok(Ok(Some(recipe))) => recipe,
            Ok(Ok(None)) => {
                ctx.stage_failed(self.name(), "no recipe markup");
                return StageOutcome::Continue;
            }
            Ok(Err(e)) => {
                ctx.stage_failed(self.name(), e.to_string());
                return StageOutcome::Continue;
            }
            Err(_) => {
                ctx.stage_failed(self.name(), "timeout");
                return StageOutcome::Continue;
            }
        };

        if !markup_passes_gates(&recipe, &ctx.config) {
            ctx.stage_failed(self.name(), "markup failed quality gates");
            return StageOutcome::Continue;
        }

        apply_structured_recipe(
            ctx,
            &recipe,
            EvidenceSource::PageMarkup,
            ExtractionMethod::SchemaOrg,
        );
        StageOutcome::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(ingredients: &[&str], instructions: &[&str]) -> StructuredRecipe {
        StructuredRecipe {
            ingredients: ingredients.iter().map(|s| s.to_string()).collect(),
            instructions: instructions.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_gates_pass_real_recipe() {
        let r = recipe(
            &["2 cups flour", "1 tsp salt", "3 eggs", "1 cup milk"],
            &["Whisk the dry ingredients.", "Add eggs and milk, mix until smooth."],
        );
        assert!(markup_passes_gates(&r, &LadderConfig::default()));
    }

    #[test]
    fn test_gates_reject_placeholder_ingredients() {
        let r = recipe(
            &["see video", "link in bio", "full recipe on my site"],
            &["Watch the video for steps and more."],
        );
        assert!(!markup_passes_gates(&r, &LadderConfig::default()));
    }

    #[test]
    fn test_gates_reject_trivial_instructions() {
        let r = recipe(&["2 cups flour", "1 tsp salt", "3 eggs"], &["Mix. Bake."]);
        assert!(!markup_passes_gates(&r, &LadderConfig::default()));
    }

    #[test]
    fn test_gates_reject_too_few_ingredients() {
        let r = recipe(
            &["2 cups flour", "1 tsp salt"],
            &["Whisk the dry ingredients thoroughly before adding the rest."],
        );
        assert!(!markup_passes_gates(&r, &LadderConfig::default()));
    }
}

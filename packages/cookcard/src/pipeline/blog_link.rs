//! Blog-link secondary extraction.
//!
//! Social captions often point at a full recipe page ("full recipe on the
//! blog"). When the ladder output is incomplete, follow the first
//! plausible outbound link, re-run structured extraction there, and fall
//! back to a model pass over the page text. The result replaces ladder
//! output only when it is clearly better (enough ingredients and steps).

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::pipeline::context::{LadderContext, Stage, StageOutcome};
use crate::pipeline::evidence::validate_evidence;
use crate::pipeline::headers::filter_section_headers;
use crate::pipeline::llm::candidates_to_ingredients;
use crate::pipeline::schema_org::apply_structured_recipe;
use crate::pipeline::signals::{count_real_ingredients, has_recipe_signals};
use crate::telemetry::TelemetryEvent;
use crate::types::card::{EvidenceSource, ExtractionMethod, Instructions, Provenance};

/// Hosts that are never the recipe page itself.
const SKIP_HOSTS: &[&str] = &[
    "instagram.com",
    "tiktok.com",
    "youtube.com",
    "youtu.be",
    "facebook.com",
    "fb.watch",
    "linktr.ee",
    "beacons.ai",
];

fn link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"https?://[^\s)\]}"'<>]+"#).unwrap())
}

/// First outbound URL in the text that could plausibly be a recipe page.
pub fn find_outbound_link(text: &str) -> Option<String> {
    for m in link_re().find_iter(text) {
        let candidate = m.as_str().trim_end_matches(['.', ',', ';', '!', ')']);
        let Ok(url) = url::Url::parse(candidate) else {
            continue;
        };
        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        if SKIP_HOSTS
            .iter()
            .any(|s| host == *s || host.ends_with(&format!(".{s}")))
        {
            continue;
        }
        return Some(candidate.to_string());
    }
    None
}

/// How many markup instruction entries carry real text.
fn step_count(steps: &[String]) -> usize {
    steps.iter().filter(|s| !s.trim().is_empty()).count()
}

pub struct BlogLinkStage;

#[async_trait::async_trait]
impl Stage for BlogLinkStage {
    fn name(&self) -> &'static str {
        "blog_link"
    }

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome {
        if !ctx.config.enable_blog_link {
            return StageOutcome::Continue;
        }
        // Only worth following when the ladder output is incomplete
        if ctx.card.ingredients.len() >= ctx.config.blog_min_ingredients && ctx.card.has_steps() {
            return StageOutcome::Continue;
        }

        let mut haystack = String::new();
        if let Some(description) = ctx.metadata.as_ref().and_then(|m| m.description.as_deref()) {
            haystack.push_str(description);
            haystack.push('\n');
        }
        if let Some(text) = ctx.source_text.as_deref() {
            haystack.push_str(text);
        }

        let Some(link) = find_outbound_link(&haystack) else {
            return StageOutcome::Continue;
        };

        if let Err(e) = ctx.deps.url_validator.validate(&link) {
            ctx.stage_failed(self.name(), format!("blocked link: {e}"));
            return StageOutcome::Continue;
        }

        // Structured markup on the linked page first
        let markup = tokio::time::timeout(
            Duration::from_secs(ctx.config.fetch_timeout_secs),
            ctx.deps.markup.recipe_markup(&link),
        )
        .await;

        if let Ok(Ok(Some(recipe))) = markup {
            if count_real_ingredients(&recipe.ingredients) >= ctx.config.blog_min_ingredients
                && step_count(&recipe.instructions) >= ctx.config.blog_min_steps
            {
                apply_structured_recipe(
                    ctx,
                    &recipe,
                    EvidenceSource::BlogPage,
                    ExtractionMethod::BlogLink,
                );
                ctx.emit(TelemetryEvent::StageSucceeded {
                    stage: self.name(),
                    cost_cents: 0,
                });
                return StageOutcome::Complete;
            }
        }

        // Model cleanup over the page text
        let page_text = match tokio::time::timeout(
            Duration::from_secs(ctx.config.fetch_timeout_secs),
            ctx.deps.markup.page_text(&link),
        )
        .await
        {
            Ok(Ok(text)) if !text.trim().is_empty() => text,
            Ok(Ok(_)) => {
                ctx.stage_failed(self.name(), "empty page text");
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

        if !has_recipe_signals(&page_text) {
            ctx.stage_failed(self.name(), "linked page has no recipe signals");
            return StageOutcome::Continue;
        }

        let title = ctx.card.title.clone().unwrap_or_default();
        let extraction = match tokio::time::timeout(
            Duration::from_secs(ctx.config.model_timeout_secs),
            ctx.deps
                .model
                .extract_from_text(&title, &page_text, ctx.platform),
        )
        .await
        {
            Ok(Ok(extraction)) => extraction,
            Ok(Err(e)) => {
                ctx.stage_failed(self.name(), e.to_string());
                return StageOutcome::Continue;
            }
            Err(_) => {
                ctx.stage_failed(self.name(), "model timeout");
                return StageOutcome::Continue;
            }
        };
        ctx.total_cost_cents += extraction.cost_cents;

        let partition = validate_evidence(&page_text, extraction.ingredients);
        let kept = filter_section_headers(partition.validated);

        // Replace only when the linked page is clearly a full recipe
        if kept.len() < ctx.config.blog_min_ingredients
            || extraction.steps.len() < ctx.config.blog_min_steps
        {
            ctx.stage_failed(self.name(), "linked page yielded too little");
            return StageOutcome::Continue;
        }

        ctx.card.ingredients = candidates_to_ingredients(
            kept,
            Provenance::DetectedByModel,
            EvidenceSource::BlogPage,
            None,
        );
        ctx.card.instructions = Instructions::from_steps(extraction.steps);
        ctx.card.extraction.method = ExtractionMethod::BlogLink;
        ctx.card.extraction.evidence_source = Some(EvidenceSource::BlogPage);
        ctx.card.extraction.add_source(EvidenceSource::BlogPage);

        ctx.emit(TelemetryEvent::StageSucceeded {
            stage: self.name(),
            cost_cents: extraction.cost_cents,
        });
        StageOutcome::Complete
    }
}

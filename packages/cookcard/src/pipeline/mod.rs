//! The ingestion ladder.
//!
//! An explicit ordered list of [`Stage`] objects, tried cheapest-first.
//! The orchestrator loops until a stage signals terminal success, a typed
//! fallback, or the list is exhausted, then finalizes the card. Stage
//! failures are never fatal; each stage catches its own provider errors
//! and falls through.

pub mod asr;
pub mod backfill;
pub mod blog_link;
pub mod cache;
pub mod context;
pub mod evidence;
pub mod headers;
pub mod llm;
pub mod merge;
pub mod metadata;
pub mod schema_org;
pub mod signals;
pub mod text_ladder;
pub mod vision;

pub use context::{ExtractRequest, LadderContext, LadderDeps, Stage, StageOutcome};

use chrono::Utc;

use crate::platform::{classify, normalize_url, Platform};
use crate::telemetry::TelemetryEvent;
use crate::traits::store::CacheEntry;
use crate::types::card::RecipeCard;
use crate::types::config::LadderConfig;
use crate::types::outcome::{CacheStatus, FallbackKind, LadderOutcome};

/// The ladder orchestrator.
pub struct Ladder {
    config: LadderConfig,
    deps: LadderDeps,
    stages: Vec<Box<dyn Stage>>,
}

/// The nominal stage order: acquisition and cache first, then the
/// structured fast path, then increasingly expensive extraction rungs.
fn default_stages() -> Vec<Box<dyn Stage>> {
    vec![
        Box::new(metadata::MetadataStage),
        Box::new(cache::CacheStage),
        Box::new(schema_org::SchemaOrgStage),
        Box::new(vision::VisionFirstStage),
        Box::new(text_ladder::TextAssemblyStage),
        Box::new(llm::LlmStage),
        Box::new(llm::EarlyReturnStage),
        Box::new(blog_link::BlogLinkStage),
        Box::new(backfill::InstructionBackfillStage),
        Box::new(vision::VisionFallbackStage),
    ]
}

impl Ladder {
    pub fn new(config: LadderConfig, deps: LadderDeps) -> Self {
        Self {
            config,
            deps,
            stages: default_stages(),
        }
    }

    /// Build with a custom stage list (tests exercise stages in isolation).
    pub fn with_stages(
        config: LadderConfig,
        deps: LadderDeps,
        stages: Vec<Box<dyn Stage>>,
    ) -> Self {
        Self {
            config,
            deps,
            stages,
        }
    }

    pub fn config(&self) -> &LadderConfig {
        &self.config
    }

    /// Run one extraction request to a terminal outcome.
    ///
    /// Infallible by design: every handled condition maps to a typed
    /// outcome, and provider failures fall through inside stages.
    pub async fn run(&self, request: ExtractRequest) -> LadderOutcome {
        // Classify. Unknown platforms map to Web; only an unparseable URL
        // short-circuits.
        let normalized = match normalize_url(&request.url) {
            Ok(url) => url,
            Err(e) => {
                let card = RecipeCard::new(request.url.clone(), Platform::Web);
                return self.fallback(card, FallbackKind::LinkOnly, format!("invalid URL: {e}"));
            }
        };

        if let Err(e) = self.deps.url_validator.validate(normalized.as_str()) {
            let card = RecipeCard::new(normalized.to_string(), Platform::Web);
            return self.fallback(card, FallbackKind::LinkOnly, format!("blocked URL: {e}"));
        }

        let platform = classify(&normalized);
        tracing::info!(url = %normalized, platform = %platform, "extraction request");

        // Advisory gates. Hourly denial maps to HTTP 429; monthly denial
        // is a structured fallback and nothing past this point runs.
        match self
            .deps
            .quota
            .check_hourly_rate_limit(&request.user_id, request.household_id.as_deref())
            .await
        {
            Ok(decision) if !decision.allowed => {
                self.deps.telemetry.record(TelemetryEvent::QuotaDenied {
                    scope: "hourly".to_string(),
                    reason: decision.reason.clone(),
                });
                return LadderOutcome::RateLimited {
                    reason: decision.reason,
                    retry_after_seconds: decision.retry_after_seconds.unwrap_or(3600),
                };
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "hourly rate-limit check failed open"),
        }

        match self.deps.quota.check_monthly_quota(&request.user_id).await {
            Ok(decision) if !decision.allowed => {
                self.deps.telemetry.record(TelemetryEvent::QuotaDenied {
                    scope: "monthly".to_string(),
                    reason: decision.reason.clone(),
                });
                let card = RecipeCard::new(normalized.to_string(), platform);
                return self.fallback(card, FallbackKind::LinkOnly, decision.reason);
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "monthly quota check failed open"),
        }

        if let Err(e) = self
            .deps
            .quota
            .note_request(&request.user_id, request.household_id.as_deref())
            .await
        {
            tracing::warn!(error = %e, "failed to record request for rate limiting");
        }

        let mut ctx = context::LadderContext::new(
            request,
            self.config.clone(),
            self.deps.clone(),
            platform,
            normalized.to_string(),
        );

        for stage in &self.stages {
            ctx.emit(TelemetryEvent::StageAttempted { stage: stage.name() });

            match stage.attempt(&mut ctx).await {
                StageOutcome::Continue => {}
                StageOutcome::Complete => return self.finalize(ctx).await,
                StageOutcome::Cached(entry) => return self.serve_cached(*entry),
                StageOutcome::Fallback { kind, reason } => {
                    let card = Self::close_partial(ctx);
                    return self.fallback(card, kind, reason);
                }
            }
        }

        // List exhausted. Enough ingredients still finalizes (e.g. a card
        // that never found instructions); otherwise return what we have
        // with a fallback marker.
        if ctx.card.ingredients.len() >= self.config.min_ingredients {
            return self.finalize(ctx).await;
        }

        let kind = if ctx.metadata.is_some() {
            FallbackKind::CookCardLite
        } else {
            FallbackKind::LinkOnly
        };
        let card = Self::close_partial(ctx);
        self.fallback(card, kind, "not enough ingredients extracted".to_string())
    }

    /// Terminal cache hit: cost-free, no mutation, no quota increment.
    fn serve_cached(&self, entry: CacheEntry) -> LadderOutcome {
        let requires_confirmation =
            entry.card.extraction.confidence < self.config.confirm_threshold;
        LadderOutcome::Success {
            card: entry.card,
            requires_confirmation,
            cache_status: CacheStatus::Cached,
        }
    }

    /// Stamp a partially built card on a fallback path.
    fn close_partial(mut ctx: context::LadderContext) -> RecipeCard {
        ctx.card.recompute_confidence();
        ctx.card.assign_sort_order();
        ctx.card.extraction.cost_cents = ctx.total_cost_cents;
        ctx.card.extraction.extractor_version = ctx.config.extractor_version.clone();
        ctx.card.extraction.extracted_at = Utc::now();
        ctx.card
    }

    fn fallback(
        &self,
        card: RecipeCard,
        kind: FallbackKind,
        reason: String,
    ) -> LadderOutcome {
        self.deps.telemetry.record(TelemetryEvent::FallbackReturned {
            kind,
            reason: reason.clone(),
        });
        LadderOutcome::Fallback {
            error: reason,
            fallback: kind,
            card,
        }
    }

    /// Close out a successful run: confidence, canonical matching, cache
    /// write, quota increment, telemetry.
    async fn finalize(&self, mut ctx: context::LadderContext) -> LadderOutcome {
        // A card without ingredients is never a success, whatever a stage
        // claimed.
        if ctx.card.ingredients.is_empty() {
            let card = Self::close_partial(ctx);
            return self.fallback(
                card,
                FallbackKind::CookCardLite,
                "no ingredients extracted".to_string(),
            );
        }

        ctx.card.recompute_confidence();
        ctx.card.assign_sort_order();

        for ingredient in &mut ctx.card.ingredients {
            match ctx.deps.catalog.lookup(&ingredient.normalized_name).await {
                Ok(Some(matched)) => ingredient.canonical_item_id = Some(matched.item_id),
                Ok(None) => {}
                Err(e) => tracing::debug!(error = %e, "catalog lookup failed"),
            }
        }

        ctx.card.extraction.extractor_version = ctx.config.extractor_version.clone();
        ctx.card.extraction.extracted_at = Utc::now();
        ctx.card.extraction.cost_cents = ctx.total_cost_cents;

        // The cache entry is the only durable artifact the ladder writes.
        if let Some(key) = ctx.cache_key.clone() {
            let entry = CacheEntry {
                key,
                card: ctx.card.clone(),
                cost_cents: ctx.total_cost_cents,
                cached_at: Utc::now(),
            };
            if let Err(e) = ctx.deps.cache.put(&entry).await {
                tracing::warn!(error = %e, "cache write failed");
            }
        }

        if let Err(e) = ctx
            .deps
            .quota
            .increment_monthly_quota(&ctx.request.user_id, ctx.total_cost_cents)
            .await
        {
            tracing::warn!(error = %e, "quota increment failed");
        }

        let confidence = ctx.card.extraction.confidence;
        ctx.emit(TelemetryEvent::LadderCompleted {
            method: ctx.card.extraction.method,
            ingredient_count: ctx.card.ingredients.len(),
            confidence,
            total_cost_cents: ctx.total_cost_cents,
        });

        LadderOutcome::Success {
            requires_confirmation: confidence < self.config.confirm_threshold,
            card: ctx.card,
            cache_status: CacheStatus::Fresh,
        }
    }
}

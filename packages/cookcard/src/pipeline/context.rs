//! Per-request state threaded through the ladder stages.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::budget::BudgetLedger;
use crate::platform::Platform;
use crate::quota::QuotaManager;
use crate::security::UrlValidator;
use crate::telemetry::{TelemetryEvent, TelemetrySink};
use crate::traits::{
    catalog::CanonicalCatalog, comments::CommentSource, markup::MarkupSource,
    metadata::MetadataSource, model::RecipeModel, store::CardCache, store::CacheEntry,
    transcript::TranscriptSource,
};
use crate::types::card::{EvidenceSource, RecipeCard};
use crate::types::config::LadderConfig;
use crate::types::metadata::PostMetadata;
use crate::types::outcome::FallbackKind;

/// An inbound extraction request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub url: String,
    pub user_id: String,
    pub household_id: Option<String>,
    #[serde(default)]
    pub bypass_cache: bool,
}

impl ExtractRequest {
    pub fn new(url: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            user_id: user_id.into(),
            household_id: None,
            bypass_cache: false,
        }
    }
}

/// Collaborators the ladder consumes. All trait objects, so tests swap in
/// mocks per capability.
#[derive(Clone)]
pub struct LadderDeps {
    pub metadata: Arc<dyn MetadataSource>,
    pub markup: Arc<dyn MarkupSource>,
    pub comments: Arc<dyn CommentSource>,
    pub transcripts: Arc<dyn TranscriptSource>,
    pub model: Arc<dyn RecipeModel>,
    pub catalog: Arc<dyn CanonicalCatalog>,
    pub cache: Arc<dyn CardCache>,
    pub quota: QuotaManager,
    pub budget: Arc<BudgetLedger>,
    pub telemetry: Arc<dyn TelemetrySink>,
    pub url_validator: Arc<UrlValidator>,
}

/// Mutable state of one ladder run.
pub struct LadderContext {
    pub request: ExtractRequest,
    pub config: LadderConfig,
    pub deps: LadderDeps,

    pub platform: Platform,
    pub normalized_url: String,

    /// The card under construction, mutated in place as stages succeed
    pub card: RecipeCard,

    pub metadata: Option<PostMetadata>,

    /// Assembled natural-language source text for model extraction
    pub source_text: Option<String>,

    /// Which acquisition stage supplied `source_text`
    pub text_source: Option<EvidenceSource>,

    /// Score of the harvested comment used as source text, if any
    pub comment_score: Option<i32>,

    /// Raw caption/transcript text, if fetched
    pub transcript: Option<String>,

    /// Content-address of this request, fixed after metadata acquisition
    pub cache_key: Option<String>,

    /// Running spend for this request in minor currency units
    pub total_cost_cents: u32,

    /// Vision output kept for cross-source merging after an insufficient
    /// vision-first attempt
    pub vision_result: Option<crate::traits::model::VisionExtraction>,
}

impl LadderContext {
    pub fn new(
        request: ExtractRequest,
        config: LadderConfig,
        deps: LadderDeps,
        platform: Platform,
        normalized_url: String,
    ) -> Self {
        let card = RecipeCard::new(normalized_url.clone(), platform);
        Self {
            request,
            config,
            deps,
            platform,
            normalized_url,
            card,
            metadata: None,
            source_text: None,
            text_source: None,
            comment_score: None,
            transcript: None,
            cache_key: None,
            total_cost_cents: 0,
            vision_result: None,
        }
    }

    /// Duration of the post's video, when metadata reported one.
    pub fn duration_seconds(&self) -> Option<u32> {
        self.metadata.as_ref().and_then(|m| m.duration_seconds)
    }

    /// Emit a telemetry event.
    pub fn emit(&self, event: TelemetryEvent) {
        self.deps.telemetry.record(event);
    }

    /// Record a stage failure and keep going.
    pub fn stage_failed(&self, stage: &'static str, reason: impl Into<String>) {
        self.emit(TelemetryEvent::StageFailed {
            stage,
            reason: reason.into(),
        });
    }

    /// Build a video reference for vision/ASR calls.
    ///
    /// Requires known duration; callers gate on that first.
    pub fn video_ref(&self) -> Option<crate::traits::model::VideoRef> {
        let metadata = self.metadata.as_ref()?;
        Some(crate::traits::model::VideoRef {
            url: self.normalized_url.clone(),
            platform: self.platform,
            duration_seconds: metadata.duration_seconds?,
            thumbnail_url: metadata.thumbnail_url.clone(),
            media_url: metadata.media_url.clone(),
        })
    }
}

/// What a stage decided.
#[derive(Debug)]
pub enum StageOutcome {
    /// Nothing terminal happened; try the next stage.
    Continue,

    /// The card is complete enough; jump to finalization.
    Complete,

    /// Terminal cache hit.
    Cached(Box<CacheEntry>),

    /// Terminal typed fallback.
    Fallback { kind: FallbackKind, reason: String },
}

/// One rung of the ladder.
///
/// Stages are ordered cheapest-first by the orchestrator and must treat
/// their own provider failures as fall-through, not errors: `attempt`
/// is infallible by contract.
#[async_trait::async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome;
}

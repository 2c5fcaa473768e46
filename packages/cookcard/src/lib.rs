//! URL-to-Recipe-Card Ingestion Ladder
//!
//! Takes a URL pointing at a social-media post or a recipe webpage and
//! produces a structured recipe card: title, creator attribution,
//! ingredients, and instructions, each carrying provenance and a
//! confidence score.
//!
//! # Design Philosophy
//!
//! **The model proposes, the validator gates.**
//!
//! - Cheapest acquisition method first, escalating only on failure
//! - Every model-derived ingredient must cite literal source evidence
//! - Hard ceilings on spend, reserved before the expensive call
//! - Handled failures are structured outcomes, never bare errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use cookcard::{ExtractRequest, Ladder, LadderConfig, LadderDeps};
//!
//! let ladder = Ladder::new(LadderConfig::default(), deps);
//! let outcome = ladder.run(ExtractRequest::new(url, user_id)).await;
//! ```
//!
//! # Modules
//!
//! - [`pipeline`] - The ladder orchestrator and its stages
//! - [`traits`] - Capability seams (metadata, markup, comments, model, ...)
//! - [`types`] - The recipe card data model and configuration
//! - [`quota`] / [`budget`] - Advisory gates and minute-denominated budget
//! - [`stores`] - Storage implementations
//! - [`catalog`] - Canonical item matching
//! - [`security`] - URL validation (SSRF protection)
//! - [`sources`] - HTTP provider implementations
//! - [`testing`] - Mock implementations for testing

pub mod budget;
pub mod catalog;
pub mod error;
pub mod pipeline;
pub mod platform;
pub mod quota;
pub mod security;
pub mod sources;
pub mod stores;
pub mod telemetry;
pub mod testing;
pub mod traits;
pub mod types;

#[cfg(feature = "openai")]
pub mod ai;

// Re-export core types at crate root
pub use error::{ExtractionError, FetchError, Result, SecurityError};
pub use pipeline::{ExtractRequest, Ladder, LadderContext, LadderDeps, Stage, StageOutcome};
pub use platform::{classify, normalize_url, Platform};
pub use quota::{Decision, QuotaManager};
pub use budget::{BudgetDenied, BudgetLedger, BudgetReservation};
pub use security::UrlValidator;
pub use telemetry::{MemorySink, TelemetryEvent, TelemetrySink, TracingSink};
pub use types::{
    card::{
        CardSource, Creator, EvidenceSource, ExtractionMeta, ExtractionMethod, Ingredient,
        IngredientConflict, Instructions, InstructionsKind, Provenance, RecipeCard,
    },
    config::{BudgetConfig, LadderConfig, QuotaConfig, Tier},
    metadata::{Comment, PostMetadata, StructuredRecipe, Transcript},
    outcome::{CacheStatus, FallbackKind, LadderOutcome},
};

// Re-export capability traits
pub use traits::{
    catalog::{CanonicalCatalog, CatalogMatch},
    comments::{CommentSource, NullCommentSource},
    markup::MarkupSource,
    metadata::MetadataSource,
    model::{RecipeModel, TextExtraction, VideoRef, VisionExtraction, VisionTarget},
    store::{CacheEntry, CardCache, QuotaStore},
    transcript::{NullTranscriptSource, TranscriptSource},
};

// Re-export pipeline helpers
pub use pipeline::{
    evidence::{normalize_for_match, validate_evidence},
    headers::{filter_section_headers, is_section_header},
    merge::{merge_sources, MergeResult, SourcedIngredients},
    signals::{has_recipe_signals, looks_like_real_ingredient, score_comment},
};

// Re-export stores and catalog
pub use catalog::StaticCatalog;
pub use stores::{cache_key, MemoryStore};

// Re-export providers
pub use sources::{HttpMarkupSource, HttpMetadataSource, HttpTranscriptSource};

#[cfg(feature = "apify")]
pub use sources::ApifyCommentSource;

#[cfg(feature = "openai")]
pub use ai::OpenAiRecipeModel;

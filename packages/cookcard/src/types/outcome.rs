//! Terminal outcomes of a ladder run.
//!
//! Handled failures are structured outcomes, not transport errors: the
//! server returns them with HTTP 200 so clients treat them as data.

use serde::{Deserialize, Serialize};

use crate::types::card::RecipeCard;

/// Whether a successful card came from the cache or was computed fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    Cached,
    Fresh,
}

/// Typed fallback for a handled failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    /// Metadata was gathered but not enough ingredients; card is partial
    CookCardLite,
    /// The source cannot be extracted (e.g. video too long); the user
    /// should enter the recipe manually
    ManualEntry,
    /// Nothing beyond the link itself is available
    LinkOnly,
}

/// Result of running the ladder for one request.
#[derive(Debug, Clone)]
pub enum LadderOutcome {
    /// A card with enough validated content.
    Success {
        card: RecipeCard,
        /// True iff mean confidence is below the confirmation threshold;
        /// the client must force manual review before downstream use.
        requires_confirmation: bool,
        cache_status: CacheStatus,
    },

    /// A handled failure with whatever was gathered along the way.
    Fallback {
        error: String,
        fallback: FallbackKind,
        card: RecipeCard,
    },

    /// Hourly rate limit denial. Mapped to HTTP 429 by the server.
    RateLimited {
        reason: String,
        retry_after_seconds: u64,
    },
}

impl LadderOutcome {
    /// The card carried by this outcome, if any.
    pub fn card(&self) -> Option<&RecipeCard> {
        match self {
            LadderOutcome::Success { card, .. } => Some(card),
            LadderOutcome::Fallback { card, .. } => Some(card),
            LadderOutcome::RateLimited { .. } => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LadderOutcome::Success { .. })
    }
}

//! Canonical item catalog capability.

use async_trait::async_trait;

use crate::error::Result;

/// Best catalog match for an extracted ingredient name.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMatch {
    /// Stable catalog identifier
    pub item_id: String,

    /// Canonical display name
    pub name: String,

    /// Match quality in [0, 1]
    pub score: f32,
}

/// Maps extracted ingredient names to canonical catalog entries via
/// alias and fuzzy matching. Enables downstream pantry matching; the
/// ladder only fills `canonical_item_id` at finalization.
#[async_trait]
pub trait CanonicalCatalog: Send + Sync {
    async fn lookup(&self, name: &str) -> Result<Option<CatalogMatch>>;
}

//! Structured recipe markup capability.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::metadata::StructuredRecipe;

/// Reads machine-readable recipe markup (schema.org `Recipe`) from a
/// webpage, and exposes the page's visible text for language-model
/// cleanup when markup is absent or incomplete.
#[async_trait]
pub trait MarkupSource: Send + Sync {
    /// Returns `Ok(None)` when the page has no recipe markup; errors are
    /// reserved for fetch/transport failures.
    async fn recipe_markup(&self, url: &str) -> FetchResult<Option<StructuredRecipe>>;

    /// Visible text of the page, tags stripped.
    async fn page_text(&self, url: &str) -> FetchResult<String>;
}

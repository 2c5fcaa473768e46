//! Storage traits for the ladder's durable state.
//!
//! Split by concern: the card cache is the only artifact the ladder
//! itself writes; quota counters back the advisory gates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::card::RecipeCard;
use crate::types::config::Tier;

/// A cached extraction result.
///
/// Keyed by SHA-256 over (url, title, description). A hit is a terminal,
/// cost-free success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub card: RecipeCard,

    /// What was spent producing the card originally
    pub cost_cents: u32,

    pub cached_at: DateTime<Utc>,
}

/// Content-addressed store of complete recipe cards.
#[async_trait]
pub trait CardCache: Send + Sync {
    /// Get an entry by key. Implementations do not enforce TTL; the
    /// ladder checks entry age against its configuration.
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>>;

    async fn put(&self, entry: &CacheEntry) -> Result<()>;
}

/// Monthly usage for one user.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct QuotaUsage {
    pub extractions: u32,
    pub cost_cents: u64,
}

/// Counters backing the quota and rate-limit gates.
///
/// Implementations must support safe concurrent read-modify-write.
#[async_trait]
pub trait QuotaStore: Send + Sync {
    /// Usage for a user in a month bucket (`"YYYY-MM"`).
    async fn monthly_usage(&self, user_id: &str, month: &str) -> Result<QuotaUsage>;

    async fn add_monthly_usage(&self, user_id: &str, month: &str, cost_cents: u32) -> Result<()>;

    /// Number of requests recorded for a scope within the trailing window.
    async fn count_recent_requests(&self, scope: &str, window_secs: u64) -> Result<u32>;

    /// Record a request for a scope at the current time.
    async fn record_request(&self, scope: &str) -> Result<()>;

    /// Subscription tier for a user. Unknown users are `Tier::Free`.
    async fn user_tier(&self, user_id: &str) -> Result<Tier>;
}

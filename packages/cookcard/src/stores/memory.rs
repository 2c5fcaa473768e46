//! In-memory storage implementation for testing and development.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::Result;
use crate::traits::store::{CacheEntry, CardCache, QuotaStore, QuotaUsage};
use crate::types::config::Tier;

/// In-memory store for cache entries and quota counters.
///
/// Useful for testing and single-node development. Not suitable for
/// multi-node production as data is lost on restart.
pub struct MemoryStore {
    cards: RwLock<HashMap<String, CacheEntry>>,
    monthly: RwLock<HashMap<String, QuotaUsage>>,
    requests: RwLock<HashMap<String, Vec<chrono::DateTime<Utc>>>>,
    tiers: RwLock<HashMap<String, Tier>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            cards: RwLock::new(HashMap::new()),
            monthly: RwLock::new(HashMap::new()),
            requests: RwLock::new(HashMap::new()),
            tiers: RwLock::new(HashMap::new()),
        }
    }

    /// Set a user's tier (tests and seeding).
    pub fn set_tier(&self, user_id: impl Into<String>, tier: Tier) {
        self.tiers.write().unwrap().insert(user_id.into(), tier);
    }

    pub fn cached_card_count(&self) -> usize {
        self.cards.read().unwrap().len()
    }

    pub fn clear(&self) {
        self.cards.write().unwrap().clear();
        self.monthly.write().unwrap().clear();
        self.requests.write().unwrap().clear();
    }

    fn monthly_key(user_id: &str, month: &str) -> String {
        format!("{user_id}:{month}")
    }
}

#[async_trait]
impl CardCache for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<CacheEntry>> {
        Ok(self.cards.read().unwrap().get(key).cloned())
    }

    async fn put(&self, entry: &CacheEntry) -> Result<()> {
        self.cards
            .write()
            .unwrap()
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }
}

#[async_trait]
impl QuotaStore for MemoryStore {
    async fn monthly_usage(&self, user_id: &str, month: &str) -> Result<QuotaUsage> {
        Ok(self
            .monthly
            .read()
            .unwrap()
            .get(&Self::monthly_key(user_id, month))
            .copied()
            .unwrap_or_default())
    }

    async fn add_monthly_usage(
        &self,
        user_id: &str,
        month: &str,
        cost_cents: u32,
    ) -> Result<()> {
        let mut monthly = self.monthly.write().unwrap();
        let usage = monthly
            .entry(Self::monthly_key(user_id, month))
            .or_default();
        usage.extractions += 1;
        usage.cost_cents += u64::from(cost_cents);
        Ok(())
    }

    async fn count_recent_requests(&self, scope: &str, window_secs: u64) -> Result<u32> {
        let cutoff = Utc::now() - Duration::seconds(window_secs as i64);
        Ok(self
            .requests
            .read()
            .unwrap()
            .get(scope)
            .map(|stamps| stamps.iter().filter(|t| **t > cutoff).count() as u32)
            .unwrap_or(0))
    }

    async fn record_request(&self, scope: &str) -> Result<()> {
        let mut requests = self.requests.write().unwrap();
        let stamps = requests.entry(scope.to_string()).or_default();
        stamps.push(Utc::now());
        // Trim entries that have aged out of any realistic window
        if stamps.len() > 1000 {
            let cutoff = Utc::now() - Duration::hours(24);
            stamps.retain(|t| *t > cutoff);
        }
        Ok(())
    }

    async fn user_tier(&self, user_id: &str) -> Result<Tier> {
        Ok(self
            .tiers
            .read()
            .unwrap()
            .get(user_id)
            .copied()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Platform;
    use crate::types::card::RecipeCard;

    #[tokio::test]
    async fn test_card_round_trip() {
        let store = MemoryStore::new();
        let entry = CacheEntry {
            key: "abc".into(),
            card: RecipeCard::new("https://example.com", Platform::Web),
            cost_cents: 12,
            cached_at: Utc::now(),
        };
        store.put(&entry).await.unwrap();

        let fetched = store.get("abc").await.unwrap().unwrap();
        assert_eq!(fetched.cost_cents, 12);
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_monthly_usage_accumulates() {
        let store = MemoryStore::new();
        store.add_monthly_usage("u1", "2026-08", 10).await.unwrap();
        store.add_monthly_usage("u1", "2026-08", 5).await.unwrap();

        let usage = store.monthly_usage("u1", "2026-08").await.unwrap();
        assert_eq!(usage.extractions, 2);
        assert_eq!(usage.cost_cents, 15);

        // Other months start clean
        let other = store.monthly_usage("u1", "2026-09").await.unwrap();
        assert_eq!(other.extractions, 0);
    }

    #[tokio::test]
    async fn test_request_window_counting() {
        let store = MemoryStore::new();
        store.record_request("user:u1").await.unwrap();
        store.record_request("user:u1").await.unwrap();

        assert_eq!(store.count_recent_requests("user:u1", 3600).await.unwrap(), 2);
        assert_eq!(store.count_recent_requests("user:u2", 3600).await.unwrap(), 0);
    }
}

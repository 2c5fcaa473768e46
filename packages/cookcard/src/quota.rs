//! Monthly quota and hourly rate-limit gates.
//!
//! All checks are advisory: they return an allow/deny [`Decision`] with a
//! human-readable reason. Deny never errors; the caller routes it to a
//! typed fallback response.

use std::sync::Arc;

use chrono::Utc;

use crate::error::Result;
use crate::traits::store::QuotaStore;
use crate::types::config::{QuotaConfig, Tier};

const HOUR_SECS: u64 = 3600;

/// Outcome of an advisory gate check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub allowed: bool,
    pub reason: String,
    pub retry_after_seconds: Option<u64>,
}

impl Decision {
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
            retry_after_seconds: None,
        }
    }

    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            retry_after_seconds: None,
        }
    }

    pub fn deny_with_retry(reason: impl Into<String>, retry_after_seconds: u64) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
            retry_after_seconds: Some(retry_after_seconds),
        }
    }
}

/// Current month bucket, `"YYYY-MM"`.
pub fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

/// Advisory quota gates over a [`QuotaStore`].
#[derive(Clone)]
pub struct QuotaManager {
    store: Arc<dyn QuotaStore>,
    config: QuotaConfig,
}

impl QuotaManager {
    pub fn new(store: Arc<dyn QuotaStore>, config: QuotaConfig) -> Self {
        Self { store, config }
    }

    /// Subscription tier for a user.
    pub async fn user_tier(&self, user_id: &str) -> Result<Tier> {
        self.store.user_tier(user_id).await
    }

    /// Whether the user's tier permits the ASR stage.
    pub async fn allows_asr(&self, user_id: &str) -> Result<bool> {
        Ok(self.config.allows_asr(self.store.user_tier(user_id).await?))
    }

    /// Has the user exhausted this month's extraction allowance?
    pub async fn check_monthly_quota(&self, user_id: &str) -> Result<Decision> {
        let tier = self.store.user_tier(user_id).await?;
        let limit = self.config.monthly_limit(tier);
        let usage = self.store.monthly_usage(user_id, &current_month()).await?;

        if usage.extractions >= limit {
            return Ok(Decision::deny(format!(
                "monthly extraction limit reached ({} of {limit})",
                usage.extractions
            )));
        }
        Ok(Decision::allow())
    }

    /// Trailing-hour request limits for the user and, when present, the
    /// household.
    pub async fn check_hourly_rate_limit(
        &self,
        user_id: &str,
        household_id: Option<&str>,
    ) -> Result<Decision> {
        let user_count = self
            .store
            .count_recent_requests(&user_scope(user_id), HOUR_SECS)
            .await?;
        if user_count >= self.config.hourly_user_limit {
            return Ok(Decision::deny_with_retry(
                format!(
                    "hourly limit reached ({user_count} of {})",
                    self.config.hourly_user_limit
                ),
                HOUR_SECS,
            ));
        }

        if let Some(household_id) = household_id {
            let household_count = self
                .store
                .count_recent_requests(&household_scope(household_id), HOUR_SECS)
                .await?;
            if household_count >= self.config.hourly_household_limit {
                return Ok(Decision::deny_with_retry(
                    format!(
                        "household hourly limit reached ({household_count} of {})",
                        self.config.hourly_household_limit
                    ),
                    HOUR_SECS,
                ));
            }
        }

        Ok(Decision::allow())
    }

    /// Record a request against the hourly windows.
    pub async fn note_request(&self, user_id: &str, household_id: Option<&str>) -> Result<()> {
        self.store.record_request(&user_scope(user_id)).await?;
        if let Some(household_id) = household_id {
            self.store
                .record_request(&household_scope(household_id))
                .await?;
        }
        Ok(())
    }

    /// Count a completed extraction and its cost against the month.
    pub async fn increment_monthly_quota(&self, user_id: &str, cost_cents: u32) -> Result<()> {
        self.store
            .add_monthly_usage(user_id, &current_month(), cost_cents)
            .await
    }
}

fn user_scope(user_id: &str) -> String {
    format!("user:{user_id}")
}

fn household_scope(household_id: &str) -> String {
    format!("household:{household_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;

    fn manager(store: Arc<MemoryStore>) -> QuotaManager {
        QuotaManager::new(
            store,
            QuotaConfig {
                free_monthly_limit: 2,
                hourly_user_limit: 3,
                hourly_household_limit: 4,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_monthly_quota_denies_at_limit() {
        let store = Arc::new(MemoryStore::new());
        let quota = manager(store);

        assert!(quota.check_monthly_quota("u1").await.unwrap().allowed);
        quota.increment_monthly_quota("u1", 5).await.unwrap();
        quota.increment_monthly_quota("u1", 7).await.unwrap();

        let decision = quota.check_monthly_quota("u1").await.unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.contains("monthly"));
    }

    #[tokio::test]
    async fn test_hourly_limit_carries_retry_after() {
        let store = Arc::new(MemoryStore::new());
        let quota = manager(store);

        for _ in 0..3 {
            quota.note_request("u1", None).await.unwrap();
        }
        let decision = quota.check_hourly_rate_limit("u1", None).await.unwrap();
        assert!(!decision.allowed);
        assert_eq!(decision.retry_after_seconds, Some(3600));
    }

    #[tokio::test]
    async fn test_household_scope_is_shared() {
        let store = Arc::new(MemoryStore::new());
        let quota = manager(store);

        for _ in 0..4 {
            quota.note_request("u1", Some("h1")).await.unwrap();
        }
        // A different user in the same household is limited
        let decision = quota
            .check_hourly_rate_limit("u2", Some("h1"))
            .await
            .unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.contains("household"));
    }
}

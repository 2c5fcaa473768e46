//! Configuration for the ingestion ladder.
//!
//! Every behavioral toggle and empirically tuned threshold is a named
//! field here, passed into the orchestrator at construction. Stage code
//! never reads ambient environment state.

use serde::{Deserialize, Serialize};

/// Subscription tier, scoping quota limits and ASR permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Free,
    Plus,
    Pro,
}

/// Configuration for the ingestion ladder.
///
/// The threshold defaults are tuned values, expected to be re-tuned per
/// deployment rather than treated as fixed behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LadderConfig {
    /// Minimum validated ingredients for a stage to count as a success.
    pub min_ingredients: usize,

    /// Minimum combined instruction text length to accept markup
    /// instructions as real.
    pub min_instruction_chars: usize,

    /// Description length at which the text ladder stops looking further.
    pub description_min_chars: usize,

    /// Assembled text below this length triggers a transcript fetch.
    pub transcript_trigger_chars: usize,

    /// Minimum comment score for a harvested comment to be used as source
    /// text.
    pub comment_score_floor: i32,

    /// How many comments to harvest per attempt.
    pub comment_fetch_limit: u32,

    /// Videos at or under this length route vision-first.
    pub short_video_max_secs: u32,

    /// Hard ceiling: videos beyond this are rejected with a manual-entry
    /// fallback (long YouTube videos get one last comment harvest first).
    pub hard_duration_ceiling_secs: u32,

    /// ASR is never attempted on videos longer than this.
    pub asr_max_duration_secs: u32,

    /// Cards below this mean confidence carry `requires_confirmation`.
    pub confirm_threshold: f32,

    /// Fixed confidence assigned to creator-authored structured markup.
    pub schema_org_confidence: f32,

    /// Cache entry lifetime.
    pub cache_ttl_days: i64,

    /// Blog-link extraction replaces ladder output only at or above these.
    pub blog_min_ingredients: usize,
    pub blog_min_steps: usize,

    /// Feature toggles.
    pub enable_schema_fast_path: bool,
    pub enable_vision: bool,
    pub enable_asr: bool,
    pub enable_blog_link: bool,

    /// Per-call timeouts, seconds.
    pub fetch_timeout_secs: u64,
    pub model_timeout_secs: u64,
    pub vision_timeout_secs: u64,
    pub asr_timeout_secs: u64,

    /// Version tag stamped on produced cards.
    pub extractor_version: String,

    pub quota: QuotaConfig,
    pub budget: BudgetConfig,
}

impl Default for LadderConfig {
    fn default() -> Self {
        Self {
            min_ingredients: 3,
            min_instruction_chars: 20,
            description_min_chars: 100,
            transcript_trigger_chars: 200,
            comment_score_floor: 20,
            comment_fetch_limit: 30,
            short_video_max_secs: 120,
            hard_duration_ceiling_secs: 600,
            asr_max_duration_secs: 300,
            confirm_threshold: 0.80,
            schema_org_confidence: 0.95,
            cache_ttl_days: 30,
            blog_min_ingredients: 3,
            blog_min_steps: 3,
            enable_schema_fast_path: true,
            enable_vision: true,
            enable_asr: true,
            enable_blog_link: true,
            fetch_timeout_secs: 10,
            model_timeout_secs: 30,
            vision_timeout_secs: 60,
            asr_timeout_secs: 60,
            extractor_version: "ladder-v1".to_string(),
            quota: QuotaConfig::default(),
            budget: BudgetConfig::default(),
        }
    }
}

impl LadderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_ingredients(mut self, n: usize) -> Self {
        self.min_ingredients = n;
        self
    }

    pub fn with_comment_score_floor(mut self, floor: i32) -> Self {
        self.comment_score_floor = floor;
        self
    }

    pub fn with_hard_duration_ceiling_secs(mut self, secs: u32) -> Self {
        self.hard_duration_ceiling_secs = secs;
        self
    }

    pub fn without_vision(mut self) -> Self {
        self.enable_vision = false;
        self
    }

    pub fn without_schema_fast_path(mut self) -> Self {
        self.enable_schema_fast_path = false;
        self
    }
}

/// Per-user quota and rate limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Monthly extraction caps per tier.
    pub free_monthly_limit: u32,
    pub plus_monthly_limit: u32,
    pub pro_monthly_limit: u32,

    /// Requests per hour per user / per household.
    pub hourly_user_limit: u32,
    pub hourly_household_limit: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_monthly_limit: 30,
            plus_monthly_limit: 200,
            pro_monthly_limit: 1000,
            hourly_user_limit: 20,
            hourly_household_limit: 40,
        }
    }
}

impl QuotaConfig {
    /// Monthly extraction cap for a tier.
    pub fn monthly_limit(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Free => self.free_monthly_limit,
            Tier::Plus => self.plus_monthly_limit,
            Tier::Pro => self.pro_monthly_limit,
        }
    }

    /// ASR is reserved for paying tiers.
    pub fn allows_asr(&self, tier: Tier) -> bool {
        !matches!(tier, Tier::Free)
    }
}

/// Minute-denominated ceilings for the vision stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Vision minutes one user may consume per month.
    pub user_monthly_vision_minutes: u32,

    /// Vision minutes the whole deployment may consume per day.
    pub global_daily_vision_minutes: u32,
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            user_monthly_vision_minutes: 30,
            global_daily_vision_minutes: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_limits() {
        let q = QuotaConfig::default();
        assert!(q.monthly_limit(Tier::Free) < q.monthly_limit(Tier::Plus));
        assert!(q.monthly_limit(Tier::Plus) < q.monthly_limit(Tier::Pro));
        assert!(!q.allows_asr(Tier::Free));
        assert!(q.allows_asr(Tier::Plus));
    }

    #[test]
    fn test_builder_toggles() {
        let config = LadderConfig::new().without_vision().with_min_ingredients(5);
        assert!(!config.enable_vision);
        assert_eq!(config.min_ingredients, 5);
        assert!(config.enable_schema_fast_path);
    }
}

//! Cache check stage.
//!
//! The key is derived from (url, title, description), so this stage runs
//! after metadata acquisition. A hit is a terminal, cost-free success;
//! `bypass_cache` forces a miss but finalization still writes the fresh
//! result back.

use chrono::{Duration as ChronoDuration, Utc};

use crate::pipeline::context::{LadderContext, Stage, StageOutcome};
use crate::stores::cache_key;
use crate::telemetry::TelemetryEvent;

pub struct CacheStage;

#[async_trait::async_trait]
impl Stage for CacheStage {
    fn name(&self) -> &'static str {
        "cache_check"
    }

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome {
        let (title, description) = ctx
            .metadata
            .as_ref()
            .map(|m| {
                (
                    m.title.clone().unwrap_or_default(),
                    m.description.clone().unwrap_or_default(),
                )
            })
            .unwrap_or_default();

        let key = cache_key(&ctx.normalized_url, &title, &description);
        ctx.cache_key = Some(key.clone());

        if ctx.request.bypass_cache {
            return StageOutcome::Continue;
        }

        let entry = match ctx.deps.cache.get(&key).await {
            Ok(entry) => entry,
            Err(e) => {
                ctx.stage_failed(self.name(), e.to_string());
                return StageOutcome::Continue;
            }
        };

        match entry {
            Some(entry)
                if entry.cached_at + ChronoDuration::days(ctx.config.cache_ttl_days)
                    > Utc::now() =>
            {
                ctx.emit(TelemetryEvent::CacheHit { key });
                StageOutcome::Cached(Box::new(entry))
            }
            _ => StageOutcome::Continue,
        }
    }
}

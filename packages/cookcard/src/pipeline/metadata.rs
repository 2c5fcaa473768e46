//! Metadata acquisition stage.
//!
//! Free and infallible from the ladder's point of view: whatever fields
//! the source platform reports land on the card, and a total failure
//! just means later stages work with less.

use std::time::Duration;

use crate::pipeline::context::{LadderContext, Stage, StageOutcome};

pub struct MetadataStage;

#[async_trait::async_trait]
impl Stage for MetadataStage {
    fn name(&self) -> &'static str {
        "metadata"
    }

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome {
        let fetch = ctx
            .deps
            .metadata
            .fetch(&ctx.normalized_url, ctx.platform);

        let metadata = match tokio::time::timeout(
            Duration::from_secs(ctx.config.fetch_timeout_secs),
            fetch,
        )
        .await
        {
            Ok(Ok(metadata)) => metadata,
            Ok(Err(e)) => {
                ctx.stage_failed(self.name(), e.to_string());
                return StageOutcome::Continue;
            }
            Err(_) => {
                ctx.stage_failed(self.name(), "timeout");
                return StageOutcome::Continue;
            }
        };

        ctx.card.title = metadata.title.clone();
        ctx.card.description = metadata.description.clone();
        ctx.card.image_url = metadata.thumbnail_url.clone();
        ctx.card.source.creator = metadata.creator.clone();
        ctx.metadata = Some(metadata);

        StageOutcome::Continue
    }
}

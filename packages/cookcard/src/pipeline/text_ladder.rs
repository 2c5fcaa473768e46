//! Text acquisition ladder.
//!
//! Assembles the best available natural-language source text for a post:
//! description first (free), then harvested comments, then a caption
//! track, concatenating or substituting as each rung adds signal. Never
//! terminal; it only feeds the model extraction stage.

use std::time::Duration;

use crate::pipeline::context::{LadderContext, Stage, StageOutcome};
use crate::pipeline::signals::score_comment;
use crate::types::card::EvidenceSource;
use crate::types::metadata::Comment;

/// Pick the highest-scoring comment at or above the floor.
pub fn best_comment(comments: &[Comment], score_floor: i32) -> Option<(&Comment, i32)> {
    comments
        .iter()
        .map(|c| (c, score_comment(&c.text)))
        .filter(|(_, score)| *score >= score_floor)
        .max_by_key(|(_, score)| *score)
}

pub struct TextAssemblyStage;

#[async_trait::async_trait]
impl Stage for TextAssemblyStage {
    fn name(&self) -> &'static str {
        "text_ladder"
    }

    async fn attempt(&self, ctx: &mut LadderContext) -> StageOutcome {
        let description = ctx
            .metadata
            .as_ref()
            .and_then(|m| m.description.clone())
            .unwrap_or_default();

        let mut text = description.trim().to_string();
        let mut source = if text.is_empty() {
            None
        } else {
            Some(EvidenceSource::Description)
        };

        // Rung 2: harvested comments, when the description is thin
        if text.len() < ctx.config.description_min_chars
            && ctx.platform.is_video()
            && ctx.deps.comments.supports(ctx.platform)
        {
            let harvest = ctx.deps.comments.harvest(
                &ctx.normalized_url,
                ctx.platform,
                ctx.config.comment_fetch_limit,
            );
            match tokio::time::timeout(
                Duration::from_secs(ctx.config.fetch_timeout_secs),
                harvest,
            )
            .await
            {
                Ok(Ok(comments)) => {
                    if let Some((comment, score)) =
                        best_comment(&comments, ctx.config.comment_score_floor)
                    {
                        text = comment.text.trim().to_string();
                        source = Some(EvidenceSource::Comments);
                        ctx.comment_score = Some(score);
                    }
                }
                Ok(Err(e)) => ctx.stage_failed(self.name(), format!("comment harvest: {e}")),
                Err(_) => ctx.stage_failed(self.name(), "comment harvest: timeout"),
            }
        }

        // Rung 3: caption track for short videos, when text is still thin
        if text.len() < ctx.config.transcript_trigger_chars {
            if let Some(duration) = ctx.duration_seconds() {
                if duration <= ctx.config.short_video_max_secs {
                    let fetch = ctx
                        .deps
                        .transcripts
                        .fetch_transcript(&ctx.normalized_url, ctx.platform);
                    match tokio::time::timeout(
                        Duration::from_secs(ctx.config.fetch_timeout_secs),
                        fetch,
                    )
                    .await
                    {
                        Ok(Ok(Some(transcript))) if !transcript.text.trim().is_empty() => {
                            ctx.transcript = Some(transcript.text.clone());
                            text = if text.is_empty() {
                                transcript.text.trim().to_string()
                            } else {
                                format!("{text}\n\n{}", transcript.text.trim())
                            };
                            source = Some(EvidenceSource::Transcript);
                        }
                        Ok(Ok(_)) => {}
                        Ok(Err(e)) => {
                            ctx.stage_failed(self.name(), format!("transcript: {e}"))
                        }
                        Err(_) => ctx.stage_failed(self.name(), "transcript: timeout"),
                    }
                }
            }
        }

        if text.is_empty() {
            ctx.stage_failed(self.name(), "no source text available");
            return StageOutcome::Continue;
        }

        ctx.source_text = Some(text);
        ctx.text_source = source;
        StageOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_comment_respects_floor() {
        let comments = vec![
            Comment::new("Looks tasty!"),
            Comment::new("Ingredients:\n1 cup flour\n2 eggs\n1 tbsp butter\n1/2 cup milk"),
        ];
        let (best, score) = best_comment(&comments, 20).unwrap();
        assert!(best.text.contains("flour"));
        assert!(score >= 20);

        // With a floor above any score, nothing qualifies
        assert!(best_comment(&comments, 1000).is_none());
    }

    #[test]
    fn test_best_comment_empty_input() {
        assert!(best_comment(&[], 0).is_none());
    }
}

//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the ladder without
//! making real model or network calls. Every capability trait has a mock
//! with builder-style configuration and call recording.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use crate::budget::BudgetLedger;
use crate::catalog::StaticCatalog;
use crate::error::{FetchError, FetchResult, Result};
use crate::pipeline::{Ladder, LadderDeps};
use crate::platform::Platform;
use crate::quota::QuotaManager;
use crate::security::UrlValidator;
use crate::stores::MemoryStore;
use crate::telemetry::MemorySink;
use crate::traits::{
    comments::CommentSource,
    markup::MarkupSource,
    metadata::MetadataSource,
    model::{
        AsrTranscript, RecipeModel, TextExtraction, VideoRef, VisionExtraction, VisionTarget,
    },
    transcript::TranscriptSource,
};
use crate::types::config::LadderConfig;
use crate::types::metadata::{Comment, PostMetadata, StructuredRecipe, Transcript};

/// Mock metadata source keyed by URL.
#[derive(Default)]
pub struct MockMetadataSource {
    responses: RwLock<HashMap<String, PostMetadata>>,
    fail_all: bool,
}

impl MockMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every fetch (simulates an unreachable platform).
    pub fn failing() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            fail_all: true,
        }
    }

    pub fn with_metadata(self, url: impl Into<String>, metadata: PostMetadata) -> Self {
        self.responses.write().unwrap().insert(url.into(), metadata);
        self
    }
}

#[async_trait]
impl MetadataSource for MockMetadataSource {
    async fn fetch(&self, url: &str, platform: Platform) -> FetchResult<PostMetadata> {
        if self.fail_all {
            return Err(FetchError::Timeout {
                url: url.to_string(),
            });
        }
        Ok(self
            .responses
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| PostMetadata::new(url, platform)))
    }

    fn name(&self) -> &str {
        "mock_metadata"
    }
}

/// Mock markup source keyed by URL.
#[derive(Default)]
pub struct MockMarkupSource {
    recipes: RwLock<HashMap<String, StructuredRecipe>>,
    pages: RwLock<HashMap<String, String>>,
}

impl MockMarkupSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipe(self, url: impl Into<String>, recipe: StructuredRecipe) -> Self {
        self.recipes.write().unwrap().insert(url.into(), recipe);
        self
    }

    pub fn with_page_text(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.write().unwrap().insert(url.into(), text.into());
        self
    }
}

#[async_trait]
impl MarkupSource for MockMarkupSource {
    async fn recipe_markup(&self, url: &str) -> FetchResult<Option<StructuredRecipe>> {
        Ok(self.recipes.read().unwrap().get(url).cloned())
    }

    async fn page_text(&self, url: &str) -> FetchResult<String> {
        Ok(self
            .pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default())
    }
}

/// Mock comment source keyed by URL.
#[derive(Default)]
pub struct MockCommentSource {
    comments: RwLock<HashMap<String, Vec<Comment>>>,
    platforms: Vec<Platform>,
}

impl MockCommentSource {
    /// Supports the YouTube family by default, mirroring production.
    pub fn new() -> Self {
        Self {
            comments: RwLock::new(HashMap::new()),
            platforms: vec![Platform::YouTube],
        }
    }

    pub fn supporting(mut self, platforms: Vec<Platform>) -> Self {
        self.platforms = platforms;
        self
    }

    pub fn with_comments(self, url: impl Into<String>, comments: Vec<Comment>) -> Self {
        self.comments.write().unwrap().insert(url.into(), comments);
        self
    }
}

#[async_trait]
impl CommentSource for MockCommentSource {
    fn supports(&self, platform: Platform) -> bool {
        self.platforms.contains(&platform)
    }

    async fn harvest(
        &self,
        url: &str,
        _platform: Platform,
        limit: u32,
    ) -> FetchResult<Vec<Comment>> {
        let mut comments = self
            .comments
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default();
        comments.truncate(limit as usize);
        Ok(comments)
    }
}

/// Mock transcript source keyed by URL.
#[derive(Default)]
pub struct MockTranscriptSource {
    transcripts: RwLock<HashMap<String, String>>,
}

impl MockTranscriptSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_transcript(self, url: impl Into<String>, text: impl Into<String>) -> Self {
        self.transcripts
            .write()
            .unwrap()
            .insert(url.into(), text.into());
        self
    }
}

#[async_trait]
impl TranscriptSource for MockTranscriptSource {
    async fn fetch_transcript(
        &self,
        url: &str,
        _platform: Platform,
    ) -> FetchResult<Option<Transcript>> {
        Ok(self
            .transcripts
            .read()
            .unwrap()
            .get(url)
            .map(|text| Transcript {
                text: text.clone(),
                language: Some("en".into()),
            }))
    }
}

/// Record of a call made to the mock model.
#[derive(Debug, Clone, PartialEq)]
pub enum MockModelCall {
    ExtractText { text_len: usize },
    ExtractVideo { target_steps_only: bool },
    Transcribe,
}

/// Mock model with queued responses and call recording.
///
/// Responses are consumed in FIFO order per capability; when a queue is
/// empty the mock returns an error, which the ladder treats as a stage
/// failure.
#[derive(Default)]
pub struct MockRecipeModel {
    text_responses: Mutex<Vec<TextExtraction>>,
    vision_responses: Mutex<Vec<VisionExtraction>>,
    asr_responses: Mutex<Vec<AsrTranscript>>,
    calls: Mutex<Vec<MockModelCall>>,
}

impl MockRecipeModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text_response(self, response: TextExtraction) -> Self {
        self.text_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_vision_response(self, response: VisionExtraction) -> Self {
        self.vision_responses.lock().unwrap().push(response);
        self
    }

    pub fn with_asr_response(self, text: impl Into<String>, cost_cents: u32) -> Self {
        self.asr_responses.lock().unwrap().push(AsrTranscript {
            text: text.into(),
            cost_cents,
        });
        self
    }

    pub fn calls(&self) -> Vec<MockModelCall> {
        self.calls.lock().unwrap().clone()
    }

    /// How many vision calls were made.
    pub fn vision_call_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, MockModelCall::ExtractVideo { .. }))
            .count()
    }

    fn pop<T>(queue: &Mutex<Vec<T>>) -> Option<T> {
        let mut queue = queue.lock().unwrap();
        if queue.is_empty() {
            None
        } else {
            Some(queue.remove(0))
        }
    }
}

#[async_trait]
impl RecipeModel for MockRecipeModel {
    async fn extract_from_text(
        &self,
        _title: &str,
        text: &str,
        _platform: Platform,
    ) -> Result<TextExtraction> {
        self.calls.lock().unwrap().push(MockModelCall::ExtractText {
            text_len: text.len(),
        });
        Self::pop(&self.text_responses)
            .ok_or_else(|| crate::error::ExtractionError::Model("no queued text response".into()))
    }

    async fn extract_from_video(
        &self,
        _video: &VideoRef,
        _title: &str,
        target: VisionTarget,
    ) -> Result<VisionExtraction> {
        self.calls.lock().unwrap().push(MockModelCall::ExtractVideo {
            target_steps_only: target == VisionTarget::StepsOnly,
        });
        Self::pop(&self.vision_responses)
            .ok_or_else(|| crate::error::ExtractionError::Model("no queued vision response".into()))
    }

    async fn transcribe(&self, _video: &VideoRef) -> Result<AsrTranscript> {
        self.calls.lock().unwrap().push(MockModelCall::Transcribe);
        Self::pop(&self.asr_responses)
            .ok_or_else(|| crate::error::ExtractionError::Model("no queued ASR response".into()))
    }
}

/// Everything a ladder test needs, with handles kept for assertions.
pub struct TestHarness {
    pub ladder: Ladder,
    pub store: Arc<MemoryStore>,
    pub budget: Arc<BudgetLedger>,
    pub telemetry: Arc<MemorySink>,
    pub model: Arc<MockRecipeModel>,
}

/// Builder assembling a [`Ladder`] from mocks.
pub struct TestHarnessBuilder {
    config: LadderConfig,
    metadata: Arc<dyn MetadataSource>,
    markup: Arc<dyn MarkupSource>,
    comments: Arc<dyn CommentSource>,
    transcripts: Arc<dyn TranscriptSource>,
    model: Arc<MockRecipeModel>,
    store: Arc<MemoryStore>,
}

impl Default for TestHarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestHarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: LadderConfig::default(),
            metadata: Arc::new(MockMetadataSource::new()),
            markup: Arc::new(MockMarkupSource::new()),
            comments: Arc::new(MockCommentSource::new()),
            transcripts: Arc::new(MockTranscriptSource::new()),
            model: Arc::new(MockRecipeModel::new()),
            store: Arc::new(MemoryStore::new()),
        }
    }

    pub fn config(mut self, config: LadderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn metadata(mut self, source: MockMetadataSource) -> Self {
        self.metadata = Arc::new(source);
        self
    }

    pub fn markup(mut self, source: MockMarkupSource) -> Self {
        self.markup = Arc::new(source);
        self
    }

    pub fn comments(mut self, source: MockCommentSource) -> Self {
        self.comments = Arc::new(source);
        self
    }

    pub fn transcripts(mut self, source: MockTranscriptSource) -> Self {
        self.transcripts = Arc::new(source);
        self
    }

    pub fn model(mut self, model: MockRecipeModel) -> Self {
        self.model = Arc::new(model);
        self
    }

    pub fn store(mut self, store: Arc<MemoryStore>) -> Self {
        self.store = store;
        self
    }

    pub fn build(self) -> TestHarness {
        let telemetry = Arc::new(MemorySink::new());
        let budget = BudgetLedger::new(self.config.budget.clone());
        let quota = QuotaManager::new(self.store.clone(), self.config.quota.clone());

        let deps = LadderDeps {
            metadata: self.metadata,
            markup: self.markup,
            comments: self.comments,
            transcripts: self.transcripts,
            model: self.model.clone(),
            catalog: Arc::new(StaticCatalog::with_seed_items()),
            cache: self.store.clone(),
            quota,
            budget: budget.clone(),
            telemetry: telemetry.clone(),
            url_validator: Arc::new(UrlValidator::new()),
        };

        TestHarness {
            ladder: Ladder::new(self.config, deps),
            store: self.store,
            budget,
            telemetry,
            model: self.model,
        }
    }
}

//! End-to-end ladder tests over mock providers.

use cookcard::testing::{
    MockCommentSource, MockMarkupSource, MockMetadataSource, MockRecipeModel,
    MockTranscriptSource, TestHarnessBuilder,
};
use cookcard::traits::model::{CandidateIngredient, TextExtraction, VisionExtraction};
use cookcard::{
    CacheStatus, Comment, ExtractRequest, ExtractionMethod, FallbackKind, LadderConfig,
    LadderOutcome, Platform, PostMetadata, Provenance, StructuredRecipe, TelemetryEvent,
};

fn candidate(name: &str, evidence: &str, confidence: f32) -> CandidateIngredient {
    CandidateIngredient::new(name)
        .with_evidence(evidence)
        .with_confidence(confidence)
}

fn vision_candidate(name: &str, confidence: f32) -> CandidateIngredient {
    CandidateIngredient::new(name).with_confidence(confidence)
}

const BLOG_URL: &str = "https://dinnerblog.example/garlic-noodles";

fn blog_markup() -> StructuredRecipe {
    StructuredRecipe {
        title: Some("Garlic Butter Noodles".into()),
        ingredients: vec![
            "200g noodles".into(),
            "4 cloves garlic".into(),
            "2 tbsp butter".into(),
            "1 tbsp soy sauce".into(),
            "1 tsp sugar".into(),
        ],
        instructions: vec![
            "Boil the noodles until just tender.".into(),
            "Melt butter and fry the garlic until fragrant.".into(),
            "Toss the noodles with the sauce and serve.".into(),
        ],
        servings: Some("2 servings".into()),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Scenario: structured markup fast path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn schema_org_fast_path_is_terminal_and_free() {
    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            BLOG_URL,
            PostMetadata::new(BLOG_URL, Platform::Web).with_title("Garlic Butter Noodles"),
        ))
        .markup(MockMarkupSource::new().with_recipe(BLOG_URL, blog_markup()))
        .build();

    let outcome = harness.ladder.run(ExtractRequest::new(BLOG_URL, "u1")).await;

    let LadderOutcome::Success {
        card,
        requires_confirmation,
        cache_status,
    } = outcome
    else {
        panic!("expected success, got {outcome:?}");
    };

    assert_eq!(card.extraction.method, ExtractionMethod::SchemaOrg);
    assert_eq!(card.extraction.cost_cents, 0);
    assert!((card.extraction.confidence - 0.95).abs() < 1e-6);
    assert!(!requires_confirmation);
    assert_eq!(cache_status, CacheStatus::Fresh);
    assert_eq!(card.ingredients.len(), 5);
    assert!(card.ingredients.iter().all(|i| i.provenance == Provenance::CreatorStructured));

    // No model stage was invoked
    assert!(harness.model.calls().is_empty());
    assert_eq!(harness.budget.outstanding_minutes(), 0);
}

// ---------------------------------------------------------------------------
// Scenario: cache round-trip
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cache_round_trip_returns_identical_card() {
    let url = "https://foodblog.example/pasta";
    let description = "Creamy pasta. You need 2 cups flour, 3 eggs, 1 tbsp butter. \
                       Whisk it all together and simmer gently until silky.";

    let metadata = PostMetadata::new(url, Platform::Web)
        .with_title("Creamy Pasta")
        .with_description(description);

    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(url, metadata))
        .model(MockRecipeModel::new().with_text_response(TextExtraction {
            ingredients: vec![
                candidate("flour", "2 cups flour", 0.9),
                candidate("eggs", "3 eggs", 0.9),
                candidate("butter", "1 tbsp butter", 0.85),
            ],
            steps: vec!["Whisk and simmer until silky.".into()],
            confidence: 0.9,
            cost_cents: 2,
        }))
        .build();

    let first = harness.ladder.run(ExtractRequest::new(url, "u1")).await;
    let LadderOutcome::Success {
        card: first_card,
        cache_status: first_status,
        ..
    } = first
    else {
        panic!("expected success, got {first:?}");
    };
    assert_eq!(first_status, CacheStatus::Fresh);
    assert_eq!(first_card.extraction.method, ExtractionMethod::LlmText);

    // The model queue is now empty: a second run can only succeed via cache.
    let second = harness.ladder.run(ExtractRequest::new(url, "u1")).await;
    let LadderOutcome::Success {
        card: second_card,
        cache_status: second_status,
        ..
    } = second
    else {
        panic!("expected cached success, got {second:?}");
    };

    assert_eq!(second_status, CacheStatus::Cached);
    assert_eq!(second_card.extraction.method, first_card.extraction.method);
    assert_eq!(
        serde_json::to_string(&second_card.ingredients).unwrap(),
        serde_json::to_string(&first_card.ingredients).unwrap()
    );
    // No additional model spend happened
    assert_eq!(harness.model.calls().len(), 1);
}

#[tokio::test]
async fn bypass_cache_forces_fresh_extraction() {
    let url = "https://foodblog.example/pasta";
    let description = "You need 2 cups flour, 3 eggs, 1 tbsp butter. Whisk and simmer.";
    let extraction = TextExtraction {
        ingredients: vec![
            candidate("flour", "2 cups flour", 0.9),
            candidate("eggs", "3 eggs", 0.9),
            candidate("butter", "1 tbsp butter", 0.85),
        ],
        steps: vec!["Whisk and simmer.".into()],
        confidence: 0.9,
        cost_cents: 2,
    };

    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            url,
            PostMetadata::new(url, Platform::Web).with_description(description),
        ))
        .model(
            MockRecipeModel::new()
                .with_text_response(extraction.clone())
                .with_text_response(extraction),
        )
        .build();

    harness.ladder.run(ExtractRequest::new(url, "u1")).await;

    let mut request = ExtractRequest::new(url, "u1");
    request.bypass_cache = true;
    let outcome = harness.ladder.run(request).await;

    let LadderOutcome::Success { cache_status, .. } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(cache_status, CacheStatus::Fresh);
    assert_eq!(harness.model.calls().len(), 2);
}

// ---------------------------------------------------------------------------
// Scenario: vision-first routing and insufficiency fallthrough
// ---------------------------------------------------------------------------

#[tokio::test]
async fn short_video_routes_vision_first() {
    let url = "https://tiktok.com/@cook/video/1";
    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            url,
            PostMetadata::new(url, Platform::TikTok)
                .with_title("60 second noodles")
                .with_duration(90),
        ))
        .model(MockRecipeModel::new().with_vision_response(VisionExtraction {
            ingredients: vec![
                vision_candidate("noodles", 0.9),
                vision_candidate("garlic", 0.9),
                vision_candidate("butter", 0.85),
                vision_candidate("soy sauce", 0.8),
            ],
            steps: vec!["Boil noodles.".into(), "Toss in garlic butter.".into()],
            confidence: 0.85,
            cost_cents: 12,
        }))
        .build();

    let outcome = harness.ladder.run(ExtractRequest::new(url, "u1")).await;

    let LadderOutcome::Success { card, .. } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(card.extraction.method, ExtractionMethod::Vision);
    assert_eq!(card.ingredients.len(), 4);
    assert!(card.has_steps());

    // One vision call, no text extraction, budget consumed permanently
    assert_eq!(harness.model.vision_call_count(), 1);
    assert_eq!(harness.budget.outstanding_minutes(), 0);
    assert_eq!(harness.budget.consumed_minutes(), 2); // 90s -> 2 minutes
}

#[tokio::test]
async fn insufficient_vision_result_falls_through() {
    let url = "https://tiktok.com/@cook/video/2";
    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            url,
            PostMetadata::new(url, Platform::TikTok).with_duration(90),
        ))
        .model(MockRecipeModel::new().with_vision_response(VisionExtraction {
            ingredients: vec![
                vision_candidate("noodles", 0.7),
                vision_candidate("garlic", 0.6),
            ],
            steps: vec![],
            confidence: 0.6,
            cost_cents: 12,
        }))
        .build();

    let outcome = harness.ladder.run(ExtractRequest::new(url, "u1")).await;

    // Two ingredients are below the success floor: the result is kept but
    // flagged as a fallback, not accepted as a success.
    let LadderOutcome::Fallback { fallback, card, .. } = outcome else {
        panic!("expected fallback, got {outcome:?}");
    };
    assert_eq!(fallback, FallbackKind::CookCardLite);
    assert_eq!(card.ingredients.len(), 2);

    // The insufficient output was reused for merging, not re-billed
    assert_eq!(harness.model.vision_call_count(), 1);
    assert_eq!(harness.budget.outstanding_minutes(), 0);
}

// ---------------------------------------------------------------------------
// Scenario: hard duration ceiling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn over_ceiling_video_rejected_without_vision() {
    let url = "https://tiktok.com/@cook/video/3";
    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            url,
            PostMetadata::new(url, Platform::TikTok)
                .with_title("Full 15 minute cook-along")
                .with_duration(900),
        ))
        .build();

    let outcome = harness.ladder.run(ExtractRequest::new(url, "u1")).await;

    let LadderOutcome::Fallback { fallback, error, .. } = outcome else {
        panic!("expected fallback, got {outcome:?}");
    };
    assert_eq!(fallback, FallbackKind::ManualEntry);
    assert!(error.contains("too long"));
    assert_eq!(harness.model.vision_call_count(), 0);
    assert_eq!(harness.budget.outstanding_minutes(), 0);
}

#[tokio::test]
async fn long_youtube_video_gets_comment_rescue() {
    let url = "https://youtube.com/watch?v=longcook";
    let comment_text = "Ingredients:\n2 cups rice\n1 lb chicken\n1 tbsp soy sauce\n2 cloves garlic";

    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            url,
            PostMetadata::new(url, Platform::YouTube)
                .with_title("Sunday meal prep")
                .with_duration(900),
        ))
        .comments(MockCommentSource::new().with_comments(
            url,
            vec![Comment::new("Looks great!"), Comment::new(comment_text)],
        ))
        .model(MockRecipeModel::new().with_text_response(TextExtraction {
            ingredients: vec![
                candidate("rice", "2 cups rice", 0.9),
                candidate("chicken", "1 lb chicken", 0.9),
                candidate("soy sauce", "1 tbsp soy sauce", 0.9),
                candidate("garlic", "2 cloves garlic", 0.85),
            ],
            steps: vec![],
            confidence: 0.9,
            cost_cents: 1,
        }))
        .build();

    let outcome = harness.ladder.run(ExtractRequest::new(url, "u1")).await;

    let LadderOutcome::Success { card, .. } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(card.extraction.method, ExtractionMethod::CommentText);
    assert_eq!(card.ingredients.len(), 4);
    assert!(card.ingredients.iter().all(|i| i.provenance == Provenance::CommentSourced));
    assert!(card.ingredients.iter().all(|i| i.comment_score.is_some()));
    assert_eq!(harness.model.vision_call_count(), 0);
}

// ---------------------------------------------------------------------------
// Scenario: quota and rate limits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn user_at_monthly_quota_gets_link_only_and_no_stages_run() {
    let mut config = LadderConfig::default();
    config.quota.free_monthly_limit = 0;

    let harness = TestHarnessBuilder::new().config(config).build();
    let outcome = harness
        .ladder
        .run(ExtractRequest::new("https://youtube.com/watch?v=abc", "u1"))
        .await;

    let LadderOutcome::Fallback { fallback, .. } = outcome else {
        panic!("expected fallback, got {outcome:?}");
    };
    assert_eq!(fallback, FallbackKind::LinkOnly);

    // No stage beyond the quota check executed
    assert!(harness.telemetry.attempted_stages().is_empty());
    assert!(harness.model.calls().is_empty());
}

#[tokio::test]
async fn hourly_rate_limit_maps_to_retry_after() {
    let mut config = LadderConfig::default();
    config.quota.hourly_user_limit = 1;

    let harness = TestHarnessBuilder::new().config(config).build();

    let first = harness
        .ladder
        .run(ExtractRequest::new("https://example.com/a", "u1"))
        .await;
    assert!(matches!(first, LadderOutcome::Fallback { .. }));

    let second = harness
        .ladder
        .run(ExtractRequest::new("https://example.com/b", "u1"))
        .await;
    let LadderOutcome::RateLimited {
        retry_after_seconds,
        ..
    } = second
    else {
        panic!("expected rate limited, got {second:?}");
    };
    assert_eq!(retry_after_seconds, 3600);
}

// ---------------------------------------------------------------------------
// Evidence invariant and confidence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fabricated_evidence_never_reaches_the_card() {
    let url = "https://foodblog.example/soup";
    let description = "Cozy soup: 2 carrots, 1 onion, 4 cups vegetable stock. Simmer 20 minutes.";

    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            url,
            PostMetadata::new(url, Platform::Web).with_description(description),
        ))
        .model(MockRecipeModel::new().with_text_response(TextExtraction {
            ingredients: vec![
                candidate("carrots", "2 carrots", 0.9),
                candidate("onion", "1 onion", 0.9),
                candidate("vegetable stock", "4 cups vegetable stock", 0.9),
                // Hallucinated: this phrase is not in the description
                candidate("saffron", "a pinch of saffron", 0.95),
                // Header masquerading as an ingredient
                candidate("For the garnish:", "Simmer", 0.9),
            ],
            steps: vec!["Simmer everything for 20 minutes.".into()],
            confidence: 0.9,
            cost_cents: 1,
        }))
        .build();

    let outcome = harness.ladder.run(ExtractRequest::new(url, "u1")).await;

    let LadderOutcome::Success { card, .. } = outcome else {
        panic!("expected success, got {outcome:?}");
    };

    assert_eq!(card.ingredients.len(), 3);
    let source = description.to_lowercase();
    for ingredient in &card.ingredients {
        let phrase = ingredient.evidence_phrase.as_deref().unwrap().to_lowercase();
        assert!(
            source.contains(&phrase),
            "evidence {phrase:?} must be literally present in the source"
        );
    }
    assert!(!card.ingredients.iter().any(|i| i.name.contains("saffron")));
    assert!(!card.ingredients.iter().any(|i| i.name.contains("garnish")));
}

#[tokio::test]
async fn low_confidence_requires_confirmation() {
    let url = "https://tiktok.com/@cook/video/4";
    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            url,
            PostMetadata::new(url, Platform::TikTok).with_duration(60),
        ))
        .model(MockRecipeModel::new().with_vision_response(VisionExtraction {
            ingredients: vec![
                vision_candidate("rice", 0.6),
                vision_candidate("eggs", 0.6),
                vision_candidate("scallions", 0.6),
            ],
            steps: vec!["Fry the rice.".into()],
            confidence: 0.6,
            cost_cents: 8,
        }))
        .build();

    let outcome = harness.ladder.run(ExtractRequest::new(url, "u1")).await;

    let LadderOutcome::Success {
        card,
        requires_confirmation,
        ..
    } = outcome
    else {
        panic!("expected success, got {outcome:?}");
    };
    assert!((card.extraction.confidence - 0.6).abs() < 1e-6);
    assert!(requires_confirmation);
}

// ---------------------------------------------------------------------------
// Text ladder end-to-end with canonical matching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn description_extraction_skips_vision_and_matches_catalog() {
    let url = "https://youtube.com/watch?v=desc1";
    let description = "Tonight's dinner! You'll need 2 cups rice, 3 eggs, 2 scallions and \
                       1 tbsp soy sauce. Fry the rice, add the eggs, season, and serve hot.";

    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            url,
            PostMetadata::new(url, Platform::YouTube)
                .with_title("Fried rice")
                .with_description(description)
                .with_duration(300),
        ))
        .model(MockRecipeModel::new().with_text_response(TextExtraction {
            ingredients: vec![
                candidate("rice", "2 cups rice", 0.9),
                candidate("eggs", "3 eggs", 0.92),
                candidate("scallions", "2 scallions", 0.88),
                candidate("soy sauce", "1 tbsp soy sauce", 0.9),
            ],
            steps: vec!["Fry the rice.".into(), "Add the eggs and season.".into()],
            confidence: 0.9,
            cost_cents: 1,
        }))
        .build();

    let outcome = harness.ladder.run(ExtractRequest::new(url, "u1")).await;

    let LadderOutcome::Success { card, .. } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(card.extraction.method, ExtractionMethod::LlmText);

    // Canonical matching ran at finalization
    let rice = card
        .ingredients
        .iter()
        .find(|i| i.normalized_name == "rice")
        .unwrap();
    assert_eq!(rice.canonical_item_id.as_deref(), Some("itm_rice"));
    let scallions = card
        .ingredients
        .iter()
        .find(|i| i.normalized_name == "scallions")
        .unwrap();
    assert!(scallions.canonical_item_id.is_some());

    // Sort order assigned by position
    let orders: Vec<u32> = card.ingredients.iter().map(|i| i.sort_order).collect();
    assert_eq!(orders, vec![0, 1, 2, 3]);
}

// ---------------------------------------------------------------------------
// Budget telemetry
// ---------------------------------------------------------------------------

#[tokio::test]
async fn vision_budget_events_are_recorded() {
    let url = "https://tiktok.com/@cook/video/5";
    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            url,
            PostMetadata::new(url, Platform::TikTok).with_duration(45),
        ))
        .model(MockRecipeModel::new().with_vision_response(VisionExtraction {
            ingredients: vec![
                vision_candidate("flour", 0.9),
                vision_candidate("milk", 0.9),
                vision_candidate("eggs", 0.9),
            ],
            steps: vec!["Blend and fry.".into()],
            confidence: 0.9,
            cost_cents: 5,
        }))
        .build();

    harness.ladder.run(ExtractRequest::new(url, "u1")).await;

    let events = harness.telemetry.events();
    assert!(events.iter().any(|e| matches!(
        e,
        TelemetryEvent::BudgetReserved { minutes: 1, .. }
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        TelemetryEvent::BudgetCommitted { minutes: 1, .. }
    )));
    assert!(events
        .iter()
        .any(|e| matches!(e, TelemetryEvent::LadderCompleted { .. })));
}

// ---------------------------------------------------------------------------
// Blog link secondary path
// ---------------------------------------------------------------------------

#[tokio::test]
async fn caption_link_to_recipe_blog_is_followed() {
    let url = "https://youtube.com/watch?v=linked";
    let description = format!("Full written recipe here: {BLOG_URL}");

    let harness = TestHarnessBuilder::new()
        .metadata(MockMetadataSource::new().with_metadata(
            url,
            PostMetadata::new(url, Platform::YouTube)
                .with_title("Garlic noodles")
                .with_description(description)
                .with_duration(300),
        ))
        .markup(MockMarkupSource::new().with_recipe(BLOG_URL, blog_markup()))
        .transcripts(MockTranscriptSource::new())
        .build();

    let outcome = harness.ladder.run(ExtractRequest::new(url, "u1")).await;

    let LadderOutcome::Success { card, .. } = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(card.extraction.method, ExtractionMethod::BlogLink);
    assert_eq!(card.ingredients.len(), 5);
    assert!(card.has_steps());
    // The ladder never needed a model for this card
    assert!(harness.model.calls().is_empty());
}

//! Application setup and router construction.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use cookcard::{
    BudgetLedger, Ladder, LadderConfig, LadderDeps, MemoryStore, NullCommentSource,
    QuotaManager, StaticCatalog, TracingSink, UrlValidator,
};
use cookcard::{ApifyCommentSource, HttpMarkupSource, HttpMetadataSource, HttpTranscriptSource};
use cookcard::{OpenAiRecipeModel, CommentSource};
use openai_client::OpenAIClient;

use crate::routes::{extract_handler, health_handler};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub ladder: Arc<Ladder>,
    pub store: Arc<MemoryStore>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

/// Wire the ladder from live providers.
pub fn build_ladder(
    config: LadderConfig,
    openai_api_key: String,
    apify_token: Option<String>,
) -> (Arc<Ladder>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());

    let comments: Arc<dyn CommentSource> = match apify_token {
        Some(token) => Arc::new(ApifyCommentSource::new(token)),
        None => {
            tracing::info!("APIFY_TOKEN not set, comment harvesting disabled");
            Arc::new(NullCommentSource)
        }
    };

    let deps = LadderDeps {
        metadata: Arc::new(HttpMetadataSource::new()),
        markup: Arc::new(HttpMarkupSource::new()),
        comments,
        transcripts: Arc::new(HttpTranscriptSource::new()),
        model: Arc::new(OpenAiRecipeModel::new(OpenAIClient::new(openai_api_key))),
        catalog: Arc::new(StaticCatalog::with_seed_items()),
        cache: store.clone(),
        quota: QuotaManager::new(store.clone(), config.quota.clone()),
        budget: BudgetLedger::new(config.budget.clone()),
        telemetry: Arc::new(TracingSink),
        url_validator: Arc::new(UrlValidator::new()),
    };

    (Arc::new(Ladder::new(config, deps)), store)
}

/// Build the Axum application router.
pub fn build_app(state: AppState) -> Router {
    // IP-level abuse limiting on the extract route, on top of the
    // domain-level per-user quota gates.
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(2)
            .burst_size(10)
            .finish()
            .expect("valid governor configuration"),
    );

    let extract_routes = Router::new()
        .route("/v1/extract", post(extract_handler))
        .layer(GovernorLayer {
            config: governor_config,
        });

    Router::new()
        .merge(extract_routes)
        .route("/health", get(health_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

//! The extraction endpoint.
//!
//! Handled failures are returned with HTTP 200 and a structured body, by
//! design: clients treat them as outcomes, not transport errors. 400 is
//! reserved for malformed input, 429 for rate-limit denial, and 500 for
//! genuinely unexpected errors.

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use cookcard::{CacheStatus, ExtractRequest, FallbackKind, LadderOutcome, RecipeCard};

use crate::app::AppState;

/// Request body. Validation is manual so a missing field yields a clean
/// 400 instead of a deserialization error.
#[derive(Debug, Deserialize)]
pub struct ExtractBody {
    pub url: Option<String>,
    pub user_id: Option<String>,
    pub household_id: Option<String>,
    #[serde(default)]
    pub bypass_cache: bool,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub cook_card: RecipeCard,
    pub requires_confirmation: bool,
    pub cache_status: CacheStatus,
}

#[derive(Debug, Serialize)]
pub struct FallbackResponse {
    pub error: String,
    pub fallback: FallbackKind,
    pub cook_card: RecipeCard,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<u64>,
}

pub async fn extract_handler(
    Extension(state): Extension<AppState>,
    Json(body): Json<ExtractBody>,
) -> axum::response::Response {
    let Some(url) = body.url.filter(|u| !u.trim().is_empty()) else {
        return bad_request("url is required");
    };
    let Some(user_id) = body.user_id.filter(|u| !u.trim().is_empty()) else {
        return bad_request("user_id is required");
    };

    let request = ExtractRequest {
        url,
        user_id,
        household_id: body.household_id,
        bypass_cache: body.bypass_cache,
    };

    match state.ladder.run(request).await {
        LadderOutcome::Success {
            card,
            requires_confirmation,
            cache_status,
        } => (
            StatusCode::OK,
            Json(SuccessResponse {
                cook_card: card,
                requires_confirmation,
                cache_status,
            }),
        )
            .into_response(),

        LadderOutcome::Fallback {
            error,
            fallback,
            card,
        } => (
            StatusCode::OK,
            Json(FallbackResponse {
                error,
                fallback,
                cook_card: card,
            }),
        )
            .into_response(),

        LadderOutcome::RateLimited {
            reason,
            retry_after_seconds,
        } => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: reason,
                retry_after_seconds: Some(retry_after_seconds),
            }),
        )
            .into_response(),
    }
}

fn bad_request(message: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.to_string(),
            retry_after_seconds: None,
        }),
    )
        .into_response()
}

//! AI assistant proxy handlers.
//!
//! Three thin proxies over the backend traits:
//! - `explain`  → chat completion (`{ "message": … }` → `{ "response": … }`)
//! - `research` → web-search digest (`{ "query": … }` → `{ "content": … }`)
//! - `generate` → text generation (`{ "prompt": … }` → `{ "generated_text": … }`)
//!
//! The generate proxy never fails outright: backend errors degrade to a
//! canned service-unavailable payload with status 200.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::warn;

use nerofea_assist::SERVICE_UNAVAILABLE_FALLBACK;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ExplainBody {
    message: String,
}

pub async fn assistant_explain(
    State(state): State<AppState>,
    Json(body): Json<ExplainBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let response = state.chat.chat(&body.message).await?;
    Ok(Json(serde_json::json!({ "response": response })))
}

#[derive(Debug, Deserialize)]
pub struct ResearchBody {
    query: String,
}

pub async fn assistant_research(
    State(state): State<AppState>,
    Json(body): Json<ResearchBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.query.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "Valid search query is required".to_string(),
        ));
    }

    let content = state.web_search.search(&body.query).await?;
    Ok(Json(serde_json::json!({ "content": content })))
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    prompt: String,
}

pub async fn assistant_generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if body.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("Prompt is required".to_string()));
    }

    match state.generation.generate(&body.prompt).await {
        Ok(generated_text) => Ok(Json(serde_json::json!({
            "generated_text": generated_text
        }))),
        Err(e) => {
            warn!(error = %e, "Text generation failed, serving fallback");
            Ok(Json(serde_json::json!({
                "generated_text": SERVICE_UNAVAILABLE_FALLBACK,
                "error": e.to_string()
            })))
        }
    }
}

//! Study-plan HTTP handlers: generation, persistence, listing.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use nerofea_core::{SaveStudyPlanRequest, StudyPlanRepository};
use nerofea_plan::{generate_plan, PlanRequest, PlanSummary};

use crate::{ApiError, AppState};

/// Generate a study plan from the cached question catalog.
pub async fn generate_study_plan(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Result<Json<PlanSummary>, ApiError> {
    let catalog = state
        .question_cache
        .get_or_fetch(&state.db.questions)
        .await?;

    let plan = generate_plan(&catalog, &request)?;
    Ok(Json(plan))
}

#[derive(Debug, Deserialize)]
pub struct SavePlanBody {
    user_id: String,
    weeks: i32,
    hours_per_week: i32,
    difficulties: Vec<String>,
    total_questions: i32,
    total_minutes: i32,
}

/// Persist a plan summary row.
pub async fn save_study_plan(
    State(state): State<AppState>,
    Json(body): Json<SavePlanBody>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    if body.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }
    if body.weeks < 1 || body.hours_per_week < 1 {
        return Err(ApiError::BadRequest(
            "weeks and hours_per_week must be >= 1".to_string(),
        ));
    }

    let record = state
        .db
        .study_plans
        .insert(SaveStudyPlanRequest {
            user_id: body.user_id,
            weeks: body.weeks,
            hours_per_week: body.hours_per_week,
            difficulties: body.difficulties,
            total_questions: body.total_questions,
            total_minutes: body.total_minutes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(serde_json::json!(record))))
}

#[derive(Debug, Deserialize)]
pub struct ListPlansQuery {
    user_id: String,
}

/// List saved plan summaries for a user, newest first.
pub async fn list_study_plans(
    State(state): State<AppState>,
    Query(query): Query<ListPlansQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if query.user_id.trim().is_empty() {
        return Err(ApiError::BadRequest("user_id is required".to_string()));
    }

    let plans = state.db.study_plans.list(&query.user_id).await?;
    Ok(Json(serde_json::json!(plans)))
}

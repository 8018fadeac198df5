use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::cv::patch::CvPatch;
use crate::cv::validation::{validate_draft, validate_patch};
use crate::errors::{AppError, AppJson};
use crate::models::cv::{CvDraft, CvId, CvRecord};
use crate::state::AppState;

/// POST /api/v1/cvs
pub async fn handle_create_cv(
    State(state): State<AppState>,
    AppJson(draft): AppJson<CvDraft>,
) -> Result<(StatusCode, Json<CvRecord>), AppError> {
    let errors = validate_draft(&draft);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let record = state.store.create(draft).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /api/v1/cvs
pub async fn handle_list_cvs(
    State(state): State<AppState>,
) -> Result<Json<Vec<CvRecord>>, AppError> {
    Ok(Json(state.store.get_all().await?))
}

/// GET /api/v1/cvs/:id
pub async fn handle_get_cv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<CvRecord>, AppError> {
    let id = CvId::new(id);
    state
        .store
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))
}

/// PATCH /api/v1/cvs/:id
pub async fn handle_update_cv(
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(patch): AppJson<CvPatch>,
) -> Result<Json<CvRecord>, AppError> {
    let errors = validate_patch(&patch);
    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }
    let id = CvId::new(id);
    state
        .store
        .update(&id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("CV {id} not found")))
}

/// DELETE /api/v1/cvs/:id
/// Deleting an unknown id is not an error.
pub async fn handle_delete_cv(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete(&CvId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

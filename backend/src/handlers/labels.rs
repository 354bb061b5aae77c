//! Label HTTP handlers

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};

use super::form::parse_id;
use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::models::{
    ApiResponse, CreateLabelRequest, LabelData, LabelResponse, UpdateLabelRequest,
};
use crate::state::AppState;

/// POST /labels/create-Label
pub async fn create_label(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<CreateLabelRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<LabelResponse>>> {
    let Json(req) = payload?;
    let label = state.label_service.create(user.id, req).await?;

    Ok(Json(ApiResponse::new(
        200,
        "Label created successfully",
        label.into(),
    )))
}

/// GET /labels/get-Label-Data/:labelId
pub async fn get_label_data(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(label_id): Path<String>,
) -> ApiResult<Json<ApiResponse<LabelData>>> {
    let label_id = parse_id("labelId", &label_id)?;
    let data = state.label_service.label_data(user.id, label_id).await?;

    Ok(Json(ApiResponse::new(
        200,
        "Label data fetched successfully",
        data,
    )))
}

/// PATCH /labels/update-Label
pub async fn update_label(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    payload: Result<Json<UpdateLabelRequest>, JsonRejection>,
) -> ApiResult<Json<ApiResponse<LabelResponse>>> {
    let Json(req) = payload?;
    let label = state.label_service.rename(user.id, req).await?;

    Ok(Json(ApiResponse::new(
        200,
        "Label updated successfully",
        label.into(),
    )))
}

/// DELETE /labels/delete-Label/:labelId
pub async fn delete_label(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(label_id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let label_id = parse_id("labelId", &label_id)?;
    state.label_service.delete(user.id, label_id).await?;

    Ok(Json(ApiResponse::new(
        200,
        "Label deleted successfully",
        (),
    )))
}

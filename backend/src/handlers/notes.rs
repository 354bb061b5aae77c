//! Note HTTP handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};

use super::form::{parse_id, NoteForm};
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthenticatedUser;
use crate::models::{ApiResponse, Note, NoteView};
use crate::state::AppState;

/// POST /notes/create-Note (multipart)
pub async fn create_note(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<Note>>)> {
    let form = NoteForm::read(multipart).await?;
    if form.note_id.is_some() {
        return Err(ApiError::validation("A new note cannot carry a noteId"));
    }

    let note = state
        .note_service
        .create(user.id, form.input, form.image)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(201, "Note created successfully", note)),
    ))
}

/// GET /notes/get-User-Notes
pub async fn get_user_notes(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> ApiResult<Json<ApiResponse<Vec<NoteView>>>> {
    let notes = state.note_service.list(user.id).await?;
    Ok(Json(ApiResponse::new(200, "Notes fetched successfully", notes)))
}

/// PATCH /notes/update-Note (multipart, `noteId` field)
pub async fn update_note(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> ApiResult<Json<ApiResponse<Note>>> {
    let form = NoteForm::read(multipart).await?;
    let note_id = form
        .note_id
        .ok_or_else(|| ApiError::validation("The field 'noteId' is required"))?;

    let note = state
        .note_service
        .update(user.id, note_id, form.input, form.image)
        .await?;

    Ok(Json(ApiResponse::new(200, "Note updated successfully", note)))
}

/// DELETE /notes/delete-Note/:noteId
pub async fn delete_note(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(note_id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let note_id = parse_id("noteId", &note_id)?;
    state.note_service.delete(user.id, note_id).await?;

    Ok(Json(ApiResponse::new(200, "Note deleted successfully", ())))
}

//! Todo list HTTP handlers

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};

use super::form::{parse_id, TodoListForm};
use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthenticatedUser;
use crate::models::{ApiResponse, TodoList};
use crate::state::AppState;

/// POST /lists/create-TodoList (multipart)
pub async fn create_todo_list(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<ApiResponse<TodoList>>)> {
    let form = TodoListForm::read(multipart).await?;
    if form.todo_list_id.is_some() {
        return Err(ApiError::validation(
            "A new todo list cannot carry a todoListId",
        ));
    }

    let list = state
        .todo_list_service
        .create(user.id, form.input, form.image)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(201, "Todo list created successfully", list)),
    ))
}

/// PATCH /lists/update-TodoList (multipart, `todoListId` field)
pub async fn update_todo_list(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    multipart: Multipart,
) -> ApiResult<Json<ApiResponse<TodoList>>> {
    let form = TodoListForm::read(multipart).await?;
    let list_id = form
        .todo_list_id
        .ok_or_else(|| ApiError::validation("The field 'todoListId' is required"))?;

    let list = state
        .todo_list_service
        .update(user.id, list_id, form.input, form.image)
        .await?;

    Ok(Json(ApiResponse::new(
        200,
        "Todo list updated successfully",
        list,
    )))
}

/// DELETE /lists/delete-TodoList/:todoListId
pub async fn delete_todo_list(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(todo_list_id): Path<String>,
) -> ApiResult<Json<ApiResponse<()>>> {
    let list_id = parse_id("todoListId", &todo_list_id)?;
    state.todo_list_service.delete(user.id, list_id).await?;

    Ok(Json(ApiResponse::new(
        200,
        "Todo list deleted successfully",
        (),
    )))
}

//! Todo list routes

use axum::{
    routing::{delete, patch, post},
    Router,
};

use crate::handlers::todo_lists;
use crate::state::AppState;

/// Create todo list routes, mounted under `/lists`
pub fn todo_list_routes() -> Router<AppState> {
    Router::new()
        .route("/create-TodoList", post(todo_lists::create_todo_list))
        .route("/update-TodoList", patch(todo_lists::update_todo_list))
        .route(
            "/delete-TodoList/:todoListId",
            delete(todo_lists::delete_todo_list).get(todo_lists::delete_todo_list),
        )
}

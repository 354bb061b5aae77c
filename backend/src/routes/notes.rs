//! Note routes

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::handlers::notes;
use crate::state::AppState;

/// Create note routes, mounted under `/notes`
pub fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/create-Note", post(notes::create_note))
        .route("/get-User-Notes", get(notes::get_user_notes))
        .route("/update-Note", patch(notes::update_note))
        .route(
            "/delete-Note/:noteId",
            delete(notes::delete_note).get(notes::delete_note),
        )
}

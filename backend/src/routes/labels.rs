//! Label routes

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::handlers::labels;
use crate::state::AppState;

/// Create label routes, mounted under `/labels`
pub fn label_routes() -> Router<AppState> {
    Router::new()
        .route("/create-Label", post(labels::create_label))
        .route("/get-Label-Data/:labelId", get(labels::get_label_data))
        .route("/update-Label", patch(labels::update_label))
        .route(
            "/delete-Label/:labelId",
            delete(labels::delete_label).get(labels::delete_label),
        )
}

//! Account routes

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::users;
use crate::state::AppState;

/// Create account routes, mounted under `/users`
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login))
        .route("/logout", post(users::logout))
        .route("/refresh-access-token", post(users::refresh_access_token))
        .route("/change-password", post(users::change_password))
        .route(
            "/get-current-user",
            get(users::get_current_user).post(users::get_current_user),
        )
        .route("/update-user-details", patch(users::update_user_details))
        .route("/get-current-user-data", get(users::get_current_user_data))
}

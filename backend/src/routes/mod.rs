//! Route definitions for the Notekeeper API

mod labels;
mod notes;
mod todo_lists;
mod users;

pub use labels::label_routes;
pub use notes::note_routes;
pub use todo_lists::todo_list_routes;
pub use users::user_routes;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::handlers::health;
use crate::middleware;
use crate::state::AppState;

/// Prefix shared by every endpoint
pub const API_PREFIX: &str = "/api/v1";

/// Assemble the full application router
pub fn app_router(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route("/healthcheck", get(health::health_check))
        .nest("/users", user_routes())
        .nest("/notes", note_routes())
        .nest("/lists", todo_list_routes())
        .nest("/labels", label_routes());

    Router::new()
        .nest(API_PREFIX, api)
        .with_state(state)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(axum::middleware::from_fn(middleware::request_tracing))
        .layer(configure_cors(config.cors_origin.as_deref()))
}

/// Credentialed CORS for the configured origins, permissive when none are set
fn configure_cors(allowed_origins: Option<&str>) -> CorsLayer {
    let Some(allowed_origins) = allowed_origins else {
        tracing::warn!("CORS_ORIGIN not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    };

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

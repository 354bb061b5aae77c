//! Middleware for the Notekeeper API
//!
//! Request tracing and the authenticated-caller extractor.

pub mod auth;
mod tracing;

pub use auth::AuthenticatedUser;
pub use tracing::request_tracing;

//! Authentication middleware
//!
//! Resolves the caller of a request from the `AccessToken` cookie or, when no
//! cookie is present, from an `Authorization: Bearer` header.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    extract::cookie::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use std::sync::Arc;

use crate::auth::SessionGuard;
use crate::error::ApiError;
use crate::models::UserResponse;

pub const ACCESS_TOKEN_COOKIE: &str = "AccessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "RefreshToken";

/// Authenticated user, without any secrets
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserResponse);

/// Token presented with the request, cookie first
async fn presented_token<S>(parts: &mut Parts, state: &S) -> Option<String>
where
    S: Send + Sync,
{
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
        .await
        .ok()
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string())
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<SessionGuard>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = presented_token(parts, state).await;
        let guard = Arc::<SessionGuard>::from_ref(state);

        let user = guard.authenticate(token.as_deref()).await?;
        Ok(AuthenticatedUser(user))
    }
}

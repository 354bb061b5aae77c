//! Session guard
//!
//! Turns a presented access token into the public view of its user. Every
//! verification failure collapses into the same `Unauthorized` error; the
//! actual cause is only logged. Storage outages surface as they are.

use std::sync::Arc;

use super::tokens::TokenService;
use crate::error::ApiError;
use crate::models::UserResponse;
use crate::storage::UserStore;

const UNAUTHORIZED: &str = "Unauthorized request";

pub struct SessionGuard {
    tokens: Arc<TokenService>,
    users: Arc<dyn UserStore>,
}

impl SessionGuard {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self { tokens, users }
    }

    /// Resolve the caller behind `token`; never mutates anything
    pub async fn authenticate(&self, token: Option<&str>) -> Result<UserResponse, ApiError> {
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| reject("no access token presented"))?;

        let user_id = self
            .tokens
            .verify_access(token)
            .map_err(|e| reject(&e.to_string()))?;

        match self.users.find_user(user_id).await {
            Ok(Some(user)) => Ok(UserResponse::from(user)),
            Ok(None) => Err(reject("token subject no longer exists")),
            Err(e) => {
                tracing::warn!(error = %e, "User lookup failed during authentication");
                Err(ApiError::from(e))
            }
        }
    }
}

fn reject(cause: &str) -> ApiError {
    tracing::debug!(cause = %cause, "Session rejected");
    ApiError::Unauthorized(UNAUTHORIZED.to_string())
}

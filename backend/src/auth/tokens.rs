//! Token service
//!
//! Issues access/refresh pairs and keeps exactly one live refresh token per
//! user. Only the SHA-256 digest of that token is stored.

use sha2::{Digest, Sha256};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::jwt::{
    generate_access_token, generate_refresh_token, verify_token, JwtError, TokenType,
};
use crate::config::Config;
use crate::error::ApiError;
use crate::models::TokenPair;
use crate::storage::{StoreError, UserStore};

#[derive(Error, Debug)]
pub enum TokenError {
    /// Bad signature, expired, wrong type, or the subject no longer exists
    #[error("Invalid refresh token: {0}")]
    InvalidToken(String),

    /// Well-formed token that is not the user's current one
    #[error("Refresh token is expired or used")]
    TokenMismatch,

    #[error("Token signing failed: {0}")]
    Signing(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidToken(cause) => {
                tracing::debug!(cause = %cause, "Refresh token rejected");
                ApiError::Unauthorized("Invalid refresh token".to_string())
            }
            TokenError::TokenMismatch => {
                ApiError::Unauthorized("Refresh token is expired or used".to_string())
            }
            TokenError::Signing(message) => ApiError::InternalError(message),
            TokenError::Store(err) => err.into(),
        }
    }
}

fn signing_error(err: JwtError) -> TokenError {
    TokenError::Signing(err.to_string())
}

/// Digest under which a refresh token is stored
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

pub struct TokenService {
    users: Arc<dyn UserStore>,
    access_secret: String,
    access_ttl_seconds: i64,
    refresh_secret: String,
    refresh_ttl_days: i64,
}

impl TokenService {
    pub fn new(users: Arc<dyn UserStore>, config: &Config) -> Self {
        Self {
            users,
            access_secret: config.access_token_secret.clone(),
            access_ttl_seconds: config.access_token_ttl_seconds,
            refresh_secret: config.refresh_token_secret.clone(),
            refresh_ttl_days: config.refresh_token_ttl_days,
        }
    }

    pub fn issue_access_token(&self, user_id: Uuid) -> Result<String, TokenError> {
        generate_access_token(user_id, &self.access_secret, self.access_ttl_seconds)
            .map_err(signing_error)
    }

    pub fn issue_refresh_token(&self, user_id: Uuid) -> Result<String, TokenError> {
        generate_refresh_token(user_id, &self.refresh_secret, self.refresh_ttl_days)
            .map_err(signing_error)
    }

    /// Subject of a valid access token
    pub fn verify_access(&self, token: &str) -> Result<Uuid, JwtError> {
        verify_token(token, &self.access_secret, TokenType::Access)
    }

    /// Issue a new pair and make its refresh token the only live one
    pub async fn rotate(&self, user_id: Uuid) -> Result<TokenPair, TokenError> {
        let pair = self.issue_pair(user_id)?;
        let stored = self
            .users
            .set_refresh_token(user_id, Some(hash_token(&pair.refresh_token)))
            .await?;
        if !stored {
            return Err(TokenError::InvalidToken("user no longer exists".to_string()));
        }
        Ok(pair)
    }

    /// Validate a presented refresh token against the stored reference
    pub async fn verify_refresh(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify_refresh_digest(token)
            .await
            .map(|(user_id, _)| user_id)
    }

    /// Exchange a refresh token for a new pair; each refresh token works once
    pub async fn refresh(&self, token: &str) -> Result<TokenPair, TokenError> {
        let (user_id, current) = self.verify_refresh_digest(token).await?;
        let pair = self.issue_pair(user_id)?;

        let swapped = self
            .users
            .replace_refresh_token(user_id, &current, hash_token(&pair.refresh_token))
            .await?;
        if !swapped {
            tracing::debug!(user_id = %user_id, "Refresh token was rotated concurrently");
            return Err(TokenError::TokenMismatch);
        }

        tracing::debug!(user_id = %user_id, "Refresh token rotated");
        Ok(pair)
    }

    /// Drop the stored reference so no refresh token is live
    pub async fn revoke(&self, user_id: Uuid) -> Result<(), TokenError> {
        self.users.set_refresh_token(user_id, None).await?;
        Ok(())
    }

    fn issue_pair(&self, user_id: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_token(user_id)?,
            refresh_token: self.issue_refresh_token(user_id)?,
        })
    }

    async fn verify_refresh_digest(&self, token: &str) -> Result<(Uuid, String), TokenError> {
        let user_id = verify_token(token, &self.refresh_secret, TokenType::Refresh)
            .map_err(|e| TokenError::InvalidToken(e.to_string()))?;

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| TokenError::InvalidToken("unknown subject".to_string()))?;

        let digest = hash_token(token);
        match user.refresh_token_hash {
            Some(stored) if stored == digest => Ok((user_id, digest)),
            _ => Err(TokenError::TokenMismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewUser;
    use crate::storage::MemoryStore;

    async fn setup() -> (TokenService, Uuid) {
        let store = MemoryStore::new();
        let user = store
            .insert_user(NewUser {
                username: "alice".to_string(),
                email: "alice@x.com".to_string(),
                full_name: "Alice".to_string(),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();
        let service = TokenService::new(Arc::new(store), &Config::for_development());
        (service, user.id)
    }

    #[tokio::test]
    async fn test_rotate_then_verify() {
        let (service, user_id) = setup().await;
        let pair = service.rotate(user_id).await.unwrap();

        assert_eq!(service.verify_refresh(&pair.refresh_token).await.unwrap(), user_id);
        assert_eq!(service.verify_access(&pair.access_token).unwrap(), user_id);
    }

    #[tokio::test]
    async fn test_rotation_supersedes_previous_token() {
        let (service, user_id) = setup().await;
        let first = service.rotate(user_id).await.unwrap();
        let second = service.rotate(user_id).await.unwrap();

        assert!(matches!(
            service.verify_refresh(&first.refresh_token).await,
            Err(TokenError::TokenMismatch)
        ));
        assert!(service.verify_refresh(&second.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_is_single_use() {
        let (service, user_id) = setup().await;
        let pair = service.rotate(user_id).await.unwrap();

        let next = service.refresh(&pair.refresh_token).await.unwrap();
        assert!(matches!(
            service.refresh(&pair.refresh_token).await,
            Err(TokenError::TokenMismatch)
        ));
        assert!(service.refresh(&next.refresh_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_access_token_is_not_a_refresh_token() {
        let (service, user_id) = setup().await;
        let pair = service.rotate(user_id).await.unwrap();

        assert!(matches!(
            service.verify_refresh(&pair.access_token).await,
            Err(TokenError::InvalidToken(_))
        ));
        assert!(service.verify_access(&pair.refresh_token).is_err());
    }

    #[tokio::test]
    async fn test_revoke_invalidates_refresh() {
        let (service, user_id) = setup().await;
        let pair = service.rotate(user_id).await.unwrap();
        service.revoke(user_id).await.unwrap();

        assert!(matches!(
            service.verify_refresh(&pair.refresh_token).await,
            Err(TokenError::TokenMismatch)
        ));
    }

    #[tokio::test]
    async fn test_rotate_for_unknown_user() {
        let (service, _) = setup().await;
        assert!(matches!(
            service.rotate(Uuid::new_v4()).await,
            Err(TokenError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_hash_token_is_hex_sha256() {
        let digest = hash_token("abc");
        assert_eq!(digest.len(), 64);
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

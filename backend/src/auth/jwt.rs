//! JWT token generation and validation
//!
//! Access and refresh tokens are both HS256 JWTs but signed with different
//! secrets, and the token type is carried as a claim so one can never stand
//! in for the other.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT-related errors
#[derive(Error, Debug)]
pub enum JwtError {
    #[error("Token encoding failed: {0}")]
    EncodingFailed(String),

    #[error("Token decoding failed: {0}")]
    DecodingFailed(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// JWT claims shared by both token kinds
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// JWT ID, unique per issued token
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    /// Token type (access or refresh)
    pub token_type: String,
}

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Generate an access token for a user
pub fn generate_access_token(
    user_id: Uuid,
    secret: &str,
    ttl_seconds: i64,
) -> Result<String, JwtError> {
    generate_token(user_id, secret, ttl_seconds, TokenType::Access)
}

/// Generate a refresh token for a user
///
/// # Arguments
/// * `user_id` - Owner of the token
/// * `secret` - Refresh token signing secret
/// * `ttl_days` - Token time-to-live in days
pub fn generate_refresh_token(
    user_id: Uuid,
    secret: &str,
    ttl_days: i64,
) -> Result<String, JwtError> {
    let ttl_seconds = ttl_days * 24 * 60 * 60;
    generate_token(user_id, secret, ttl_seconds, TokenType::Refresh)
}

fn generate_token(
    user_id: Uuid,
    secret: &str,
    ttl_seconds: i64,
    token_type: TokenType,
) -> Result<String, JwtError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(ttl_seconds);

    let claims = Claims {
        sub: user_id.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        token_type: token_type.as_str().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::EncodingFailed(e.to_string()))
}

/// Verify a token's signature, expiry and type, returning its subject
///
/// # Returns
/// * `Ok(Uuid)` if the token is valid and of the expected type
/// * `Err(JwtError)` if validation fails
pub fn verify_token(token: &str, secret: &str, expected: TokenType) -> Result<Uuid, JwtError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => JwtError::TokenExpired,
        _ => JwtError::DecodingFailed(e.to_string()),
    })?;

    let claims = token_data.claims;
    if claims.token_type != expected.as_str() {
        return Err(JwtError::InvalidToken(format!(
            "expected {} token, got {}",
            expected.as_str(),
            claims.token_type
        )));
    }

    get_user_id_from_claims(&claims)
}

/// Extract user ID from claims
pub fn get_user_id_from_claims(claims: &Claims) -> Result<Uuid, JwtError> {
    Uuid::parse_str(&claims.sub).map_err(|e| JwtError::InvalidToken(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_access_token() {
        let user_id = Uuid::new_v4();
        let secret = "test-secret-key";

        let token = generate_access_token(user_id, secret, 900).unwrap();
        assert!(!token.is_empty());

        let subject = verify_token(&token, secret, TokenType::Access).unwrap();
        assert_eq!(subject, user_id);
    }

    #[test]
    fn test_generate_refresh_token() {
        let user_id = Uuid::new_v4();
        let secret = "test-secret-key";

        let token = generate_refresh_token(user_id, secret, 7).unwrap();
        assert_eq!(
            verify_token(&token, secret, TokenType::Refresh).unwrap(),
            user_id
        );
    }

    #[test]
    fn test_token_type_is_enforced() {
        let user_id = Uuid::new_v4();
        let token = generate_refresh_token(user_id, "shared", 7).unwrap();

        let result = verify_token(&token, "shared", TokenType::Access);
        assert!(matches!(result, Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn test_tokens_issued_together_differ() {
        let user_id = Uuid::new_v4();
        let a = generate_access_token(user_id, "secret", 900).unwrap();
        let b = generate_access_token(user_id, "secret", 900).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_expired_token() {
        let token = generate_access_token(Uuid::new_v4(), "secret", -10).unwrap();
        let result = verify_token(&token, "secret", TokenType::Access);
        assert!(matches!(result, Err(JwtError::TokenExpired)));
    }

    #[test]
    fn test_invalid_token() {
        let secret = "test-secret-key";
        let result = verify_token("invalid.token.here", secret, TokenType::Access);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let token = generate_access_token(Uuid::new_v4(), "secret1", 900).unwrap();
        let result = verify_token(&token, "secret2", TokenType::Access);
        assert!(result.is_err());
    }
}

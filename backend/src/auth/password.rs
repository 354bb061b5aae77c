//! Password hashing
//!
//! bcrypt is CPU bound, so both operations run on the blocking pool.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Password hashing task failed: {0}")]
    Join(String),
}

impl From<tokio::task::JoinError> for PasswordError {
    fn from(err: tokio::task::JoinError) -> Self {
        PasswordError::Join(err.to_string())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let password = password.to_string();
        let cost = self.cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await?
            .map_err(|e| PasswordError::Hash(e.to_string()))
    }

    /// False for a wrong password and for a malformed stored hash
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let password = password.to_string();
        let hash = hash.to_string();
        let matched = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await?
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Stored password hash could not be parsed");
                false
            });
        Ok(matched)
    }
}

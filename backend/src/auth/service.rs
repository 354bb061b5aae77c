//! Account service
//!
//! Registration, credential login, session refresh and profile management.

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::password::{PasswordError, PasswordHasher};
use super::tokens::TokenService;
use crate::error::{ApiError, ApiResult};
use crate::models::{
    ChangePasswordRequest, LabelResponse, LoginRequest, LoginResponse, NewUser, ProfileChanges,
    RegisterRequest, TokenPair, UpdateAccountRequest, UserDataResponse, UserResponse,
    MAX_PASSWORD_BYTES,
};
use crate::storage::{LabelStore, NoteStore, TodoListStore, UserStore};

const INVALID_CREDENTIALS: &str = "Invalid user credentials";

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

/// Account flows
pub struct AuthService {
    users: Arc<dyn UserStore>,
    notes: Arc<dyn NoteStore>,
    lists: Arc<dyn TodoListStore>,
    labels: Arc<dyn LabelStore>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserStore>,
        notes: Arc<dyn NoteStore>,
        lists: Arc<dyn TodoListStore>,
        labels: Arc<dyn LabelStore>,
        tokens: Arc<TokenService>,
        hasher: PasswordHasher,
    ) -> Self {
        Self {
            users,
            notes,
            lists,
            labels,
            tokens,
            hasher,
        }
    }

    /// Create an account; username and email are stored lowercased
    pub async fn register(&self, req: RegisterRequest) -> ApiResult<UserResponse> {
        req.validate()?;
        check_password_bytes(&req.password)?;

        let password_hash = self.hasher.hash(&req.password).await?;
        let user = self
            .users
            .insert_user(NewUser {
                username: req.username.trim().to_lowercase(),
                email: req.email.trim().to_lowercase(),
                full_name: req.full_name.trim().to_string(),
                password_hash,
            })
            .await?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user.into())
    }

    /// Verify credentials and start a session
    pub async fn login(&self, req: LoginRequest) -> ApiResult<LoginResponse> {
        req.validate()?;

        let username = normalize_login(req.username.as_deref());
        let email = normalize_login(req.email.as_deref());
        if username.is_none() && email.is_none() {
            return Err(ApiError::validation("Username or email is required"));
        }

        let user = self
            .users
            .find_user_by_login(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

        if !self.hasher.verify(&req.password, &user.password_hash).await? {
            tracing::debug!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ApiError::Unauthorized(INVALID_CREDENTIALS.to_string()));
        }

        let pair = self.tokens.rotate(user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");

        Ok(LoginResponse {
            user: user.into(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    pub async fn logout(&self, user_id: Uuid) -> ApiResult<()> {
        self.tokens.revoke(user_id).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    /// Exchange the presented refresh token for a new pair
    pub async fn refresh(&self, refresh_token: Option<&str>) -> ApiResult<TokenPair> {
        let token = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

        Ok(self.tokens.refresh(token).await?)
    }

    /// Replace the password; every other session has to log in again
    pub async fn change_password(&self, user_id: Uuid, req: ChangePasswordRequest) -> ApiResult<()> {
        req.validate()?;
        check_password_bytes(&req.new_password)?;

        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Unauthorized request".to_string()))?;

        if !self
            .hasher
            .verify(&req.old_password, &user.password_hash)
            .await?
        {
            return Err(ApiError::validation("Password is invalid"));
        }

        let password_hash = self.hasher.hash(&req.new_password).await?;
        self.users.update_password(user_id, password_hash).await?;
        self.tokens.revoke(user_id).await?;

        tracing::info!(user_id = %user_id, "Password changed");
        Ok(())
    }

    pub async fn update_account(
        &self,
        user_id: Uuid,
        req: UpdateAccountRequest,
    ) -> ApiResult<UserResponse> {
        req.validate()?;
        if req.email.is_none() && req.full_name.is_none() {
            return Err(ApiError::validation(
                "At least one of email or fullName is required",
            ));
        }

        let changes = ProfileChanges {
            email: req.email.map(|e| e.trim().to_lowercase()),
            full_name: req.full_name.map(|n| n.trim().to_string()),
        };

        let user = self
            .users
            .update_profile(user_id, changes)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(user.into())
    }

    /// All notes, todo lists and labels owned by the caller
    pub async fn user_data(&self, user_id: Uuid) -> ApiResult<UserDataResponse> {
        let (notes, todo_lists, labels) = tokio::try_join!(
            self.notes.list_notes(user_id),
            self.lists.list_lists(user_id),
            self.labels.list_labels(user_id),
        )?;

        Ok(UserDataResponse {
            notes,
            todo_lists,
            labels: labels.into_iter().map(LabelResponse::from).collect(),
        })
    }
}

fn normalize_login(value: Option<&str>) -> Option<String> {
    value
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
}

fn check_password_bytes(password: &str) -> ApiResult<()> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ApiError::validation(format!(
            "Password cannot exceed {} bytes",
            MAX_PASSWORD_BYTES
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::MemoryStore;

    fn service() -> AuthService {
        let store = Arc::new(MemoryStore::new());
        let tokens = Arc::new(TokenService::new(store.clone(), &Config::for_development()));
        AuthService::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store,
            tokens,
            PasswordHasher::new(4),
        )
    }

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "pw123456".to_string(),
            full_name: "Alice Doe".to_string(),
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(username.to_string()),
            email: None,
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_lowercases_and_rejects_duplicates() {
        let service = service();
        let user = service
            .register(register_request("Alice", "Alice@X.com"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@x.com");

        let err = service
            .register(register_request("ALICE", "other@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_matches_unknown_user() {
        let service = service();
        service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();

        let wrong = service
            .login(login_request("alice", "nope"))
            .await
            .unwrap_err();
        let unknown = service
            .login(login_request("bob", "pw123456"))
            .await
            .unwrap_err();
        assert_eq!(wrong.to_string(), unknown.to_string());
        assert!(matches!(wrong, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_login_requires_an_identifier() {
        let service = service();
        let err = service
            .login(LoginRequest {
                username: Some("  ".to_string()),
                email: None,
                password: "pw".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_change_password_ends_other_sessions() {
        let service = service();
        let user = service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();
        let session = service
            .login(login_request("alice", "pw123456"))
            .await
            .unwrap();

        let err = service
            .change_password(
                user.id,
                ChangePasswordRequest {
                    old_password: "wrong".to_string(),
                    new_password: "newpass".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        service
            .change_password(
                user.id,
                ChangePasswordRequest {
                    old_password: "pw123456".to_string(),
                    new_password: "newpass".to_string(),
                },
            )
            .await
            .unwrap();

        assert!(service
            .refresh(Some(&session.refresh_token))
            .await
            .is_err());
        assert!(service.login(login_request("alice", "newpass")).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_account_requires_a_field() {
        let service = service();
        let user = service
            .register(register_request("alice", "alice@x.com"))
            .await
            .unwrap();

        let err = service
            .update_account(
                user.id,
                UpdateAccountRequest {
                    email: None,
                    full_name: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));

        let updated = service
            .update_account(
                user.id,
                UpdateAccountRequest {
                    email: Some("NEW@x.com".to_string()),
                    full_name: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "new@x.com");
        assert_eq!(updated.full_name, "Alice Doe");
    }
}

//! Account and session DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{not_blank, LabelResponse, Note, TodoList, UserResponse};

/// bcrypt only reads the first 72 bytes of its input
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Request to register a new account
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 50), custom = "not_blank")]
    pub username: String,
    #[validate(email(message = "Email pattern is invalid"))]
    pub email: String,
    #[validate(length(min = 1, max = 72), custom = "not_blank")]
    pub password: String,
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub full_name: String,
}

/// Login with either username or email
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub username: Option<String>,
    #[validate(email(message = "Email pattern is invalid"))]
    pub email: Option<String>,
    #[validate(length(min = 1), custom = "not_blank")]
    pub password: String,
}

/// Refresh token request; the cookie takes precedence when both are sent
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    #[serde(alias = "RefreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1), custom = "not_blank")]
    pub old_password: String,
    #[validate(length(min = 1, max = 72), custom = "not_blank")]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[validate(email(message = "Email pattern is invalid"))]
    pub email: Option<String>,
    #[validate(length(min = 1, max = 100), custom = "not_blank")]
    pub full_name: Option<String>,
}

/// Access/refresh pair handed out by login and refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub refresh_token: String,
}

/// Everything a user owns
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataResponse {
    pub notes: Vec<Note>,
    pub todo_lists: Vec<TodoList>,
    pub labels: Vec<LabelResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_validation() {
        let valid = RegisterRequest {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password: "pw123456".to_string(),
            full_name: "Alice Doe".to_string(),
        };
        assert!(valid.validate().is_ok());

        let blank_username = RegisterRequest {
            username: "   ".to_string(),
            ..valid_clone(&valid)
        };
        assert!(blank_username.validate().is_err());

        let bad_email = RegisterRequest {
            email: "not-an-email".to_string(),
            ..valid_clone(&valid)
        };
        assert!(bad_email.validate().is_err());

        let long_password = RegisterRequest {
            password: "x".repeat(MAX_PASSWORD_BYTES + 1),
            ..valid_clone(&valid)
        };
        assert!(long_password.validate().is_err());
    }

    #[test]
    fn test_refresh_request_accepts_legacy_field_name() {
        let req: RefreshTokenRequest =
            serde_json::from_str(r#"{"RefreshToken":"abc"}"#).unwrap();
        assert_eq!(req.refresh_token.as_deref(), Some("abc"));

        let req: RefreshTokenRequest = serde_json::from_str(r#"{"refreshToken":"xyz"}"#).unwrap();
        assert_eq!(req.refresh_token.as_deref(), Some("xyz"));
    }

    fn valid_clone(req: &RegisterRequest) -> RegisterRequest {
        RegisterRequest {
            username: req.username.clone(),
            email: req.email.clone(),
            password: req.password.clone(),
            full_name: req.full_name.clone(),
        }
    }
}

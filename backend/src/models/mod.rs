//! Data models for the Notekeeper backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::ValidationError;

pub mod auth;
pub mod label;
pub mod note;
pub mod todo_list;

pub use auth::*;
pub use label::*;
pub use note::*;
pub use todo_list::*;

/// Longest accepted title for notes and todo lists
pub const MAX_TITLE_CHARS: usize = 100;

/// User model
///
/// Carries the password hash and the refresh-token digest, so it is never
/// serialized directly. Handlers expose [`UserResponse`] instead.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub refresh_token_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Fields required to persist a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
}

/// Partial profile update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Background colour shared by notes and todo lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Color {
    #[serde(rename = "#F5D3B0")]
    Cream,
    #[serde(rename = "#256377")]
    Fog,
    #[serde(rename = "#0C625D")]
    Sage,
    #[serde(rename = "#264D3B")]
    Mint,
    #[serde(rename = "#77172E")]
    Coral,
    #[serde(rename = "#284255")]
    Storm,
    #[serde(rename = "#472E5B")]
    Dusk,
    #[serde(rename = "#6C394F")]
    Blossom,
    #[serde(rename = "#692B17")]
    Peach,
    #[serde(rename = "#7C4A03")]
    Sand,
    #[serde(rename = "#4B443A")]
    Clay,
    #[serde(rename = "#232427")]
    Chalk,
}

impl Color {
    pub const ALL: [Color; 12] = [
        Color::Cream,
        Color::Fog,
        Color::Sage,
        Color::Mint,
        Color::Coral,
        Color::Storm,
        Color::Dusk,
        Color::Blossom,
        Color::Peach,
        Color::Sand,
        Color::Clay,
        Color::Chalk,
    ];

    /// Canonical uppercase hex form
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Cream => "#F5D3B0",
            Color::Fog => "#256377",
            Color::Sage => "#0C625D",
            Color::Mint => "#264D3B",
            Color::Coral => "#77172E",
            Color::Storm => "#284255",
            Color::Dusk => "#472E5B",
            Color::Blossom => "#6C394F",
            Color::Peach => "#692B17",
            Color::Sand => "#7C4A03",
            Color::Clay => "#4B443A",
            Color::Chalk => "#232427",
        }
    }

    /// Parse a palette entry, ignoring hex digit case
    pub fn parse(value: &str) -> Option<Color> {
        let value = value.trim();
        Color::ALL
            .into_iter()
            .find(|color| color.as_str().eq_ignore_ascii_case(value))
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn new(status_code: u16, message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            status_code,
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Rejects strings made only of whitespace
pub(crate) fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

//! Note models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::{not_blank, Color, LabelSummary};

pub const MAX_TEXT_CONTENT_CHARS: usize = 50_000;

/// Note model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    pub text_content: String,
    pub color: Color,
    pub created_by: Uuid,
    pub label: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Note listing entry with its label resolved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    #[serde(flatten)]
    pub note: Note,
    pub label_details: Option<LabelSummary>,
}

/// Validated note fields, shared by create and update
#[derive(Debug, Clone, Validate)]
pub struct NoteInput {
    #[validate(
        length(min = 1, max = 100, message = "Title must be 1 to 100 characters"),
        custom = "not_blank"
    )]
    pub title: String,
    #[validate(
        length(min = 1, max = 50000, message = "Text content must be 1 to 50000 characters"),
        custom = "not_blank"
    )]
    pub text_content: String,
    pub color: Color,
    pub label: Option<Uuid>,
}

/// Fields written when a note is created
#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub text_content: String,
    pub color: Color,
    pub created_by: Uuid,
    pub label: Option<Uuid>,
    pub image_url: Option<String>,
}

/// Full replacement of a note's mutable fields
#[derive(Debug, Clone)]
pub struct NoteChanges {
    pub title: String,
    pub text_content: String,
    pub color: Color,
    pub label: Option<Uuid>,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, text: &str) -> NoteInput {
        NoteInput {
            title: title.to_string(),
            text_content: text.to_string(),
            color: Color::Chalk,
            label: None,
        }
    }

    #[test]
    fn test_note_input_bounds() {
        assert!(input("T", "body").validate().is_ok());
        assert!(input("", "body").validate().is_err());
        assert!(input(" ", "body").validate().is_err());
        assert!(input(&"t".repeat(101), "body").validate().is_err());
        assert!(input(&"t".repeat(100), "body").validate().is_ok());
        assert!(input("T", "").validate().is_err());
        assert!(input("T", &"b".repeat(MAX_TEXT_CONTENT_CHARS + 1))
            .validate()
            .is_err());
    }

    #[test]
    fn test_note_view_flattens_note_fields() {
        let now = Utc::now();
        let label_id = Uuid::new_v4();
        let view = NoteView {
            note: Note {
                id: Uuid::new_v4(),
                title: "T".to_string(),
                text_content: "body".to_string(),
                color: Color::Fog,
                created_by: Uuid::new_v4(),
                label: Some(label_id),
                image_url: None,
                created_at: now,
                updated_at: now,
            },
            label_details: Some(LabelSummary {
                id: label_id,
                label_name: "Work".to_string(),
            }),
        };

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["title"], "T");
        assert_eq!(json["color"], "#256377");
        assert_eq!(json["labelDetails"]["labelName"], "Work");
    }
}

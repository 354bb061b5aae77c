//! Label models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use super::{not_blank, Note, TodoList};

pub const MAX_LABEL_NAME_CHARS: usize = 25;

/// User-defined tag attachable to notes and todo lists
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Label {
    pub id: Uuid,
    pub label_name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelResponse {
    pub id: Uuid,
    pub label_name: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Label> for LabelResponse {
    fn from(label: Label) -> Self {
        Self {
            id: label.id,
            label_name: label.label_name,
            created_by: label.created_by,
            created_at: label.created_at,
            updated_at: label.updated_at,
        }
    }
}

/// Compact label reference embedded in note listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSummary {
    pub id: Uuid,
    pub label_name: String,
}

impl From<&Label> for LabelSummary {
    fn from(label: &Label) -> Self {
        Self {
            id: label.id,
            label_name: label.label_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLabelRequest {
    #[validate(
        length(min = 1, max = 25, message = "Label name must be 1 to 25 characters"),
        custom = "not_blank"
    )]
    pub label_name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLabelRequest {
    pub label_id: Uuid,
    #[validate(
        length(min = 1, max = 25, message = "Label name must be 1 to 25 characters"),
        custom = "not_blank"
    )]
    pub label_name: String,
}

/// Notes and todo lists of one user that reference a label
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelData {
    pub notes: Vec<Note>,
    pub todo_lists: Vec<TodoList>,
}

//! Todo list models and todo-item validation

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use super::{not_blank, Color};

pub const MAX_TODO_ITEM_CHARS: usize = 150;

/// Todo item validation errors, each citing the offending position
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TodoItemError {
    #[error("The todo-items cannot be empty")]
    Empty,

    #[error("Item at index {0} is not valid JSON")]
    Unparsable(usize),

    #[error("Item at index {0} is not an object")]
    NotAnObject(usize),

    #[error("Item at index {0} is missing the '{1}' key")]
    MissingKey(usize, &'static str),

    #[error("Item at index {0} has an unexpected key '{1}'")]
    UnexpectedKey(usize, String),

    #[error("The 'value' of item at index {0} is not a string")]
    ValueNotString(usize),

    #[error("The 'value' of item at index {0} cannot be empty")]
    ValueEmpty(usize),

    #[error("The 'value' of item at index {0} exceeds 150 characters")]
    ValueTooLong(usize),

    #[error("The 'status' of item at index {0} is not a boolean")]
    StatusNotBoolean(usize),
}

/// Single entry of a todo list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub value: String,
    pub status: bool,
}

impl TodoItem {
    pub fn new(value: impl Into<String>, status: bool) -> Self {
        Self {
            value: value.into(),
            status,
        }
    }
}

/// Todo list model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoList {
    pub id: Uuid,
    pub title: String,
    pub todo_items: Vec<TodoItem>,
    pub color: Color,
    pub created_by: Uuid,
    pub label: Option<Uuid>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated todo list fields, shared by create and update
#[derive(Debug, Clone, Validate)]
pub struct TodoListInput {
    #[validate(
        length(min = 1, max = 100, message = "Title must be 1 to 100 characters"),
        custom = "not_blank"
    )]
    pub title: String,
    pub todo_items: Vec<TodoItem>,
    pub color: Color,
    pub label: Option<Uuid>,
}

#[derive(Debug, Clone)]
pub struct NewTodoList {
    pub title: String,
    pub todo_items: Vec<TodoItem>,
    pub color: Color,
    pub created_by: Uuid,
    pub label: Option<Uuid>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TodoListChanges {
    pub title: String,
    pub todo_items: Vec<TodoItem>,
    pub color: Color,
    pub label: Option<Uuid>,
    pub image_url: Option<String>,
}

/// Check the typed item sequence: non-empty, every value present and bounded.
pub fn check_todo_items(items: &[TodoItem]) -> Result<(), TodoItemError> {
    if items.is_empty() {
        return Err(TodoItemError::Empty);
    }
    for (index, item) in items.iter().enumerate() {
        if item.value.trim().is_empty() {
            return Err(TodoItemError::ValueEmpty(index));
        }
        if item.value.chars().count() > MAX_TODO_ITEM_CHARS {
            return Err(TodoItemError::ValueTooLong(index));
        }
    }
    Ok(())
}

/// Decode todo items from raw form fields.
///
/// Each field holds either one JSON object or a JSON array of objects; the
/// items of all fields are concatenated in order. Every item must be an object
/// with exactly a string `value` and a boolean `status`.
pub fn parse_todo_items(fields: &[String]) -> Result<Vec<TodoItem>, TodoItemError> {
    let mut raw_items = Vec::new();
    for field in fields {
        let position = raw_items.len();
        match serde_json::from_str::<Value>(field) {
            Ok(Value::Array(values)) => raw_items.extend(values),
            Ok(value) => raw_items.push(value),
            Err(_) => return Err(TodoItemError::Unparsable(position)),
        }
    }

    let items = raw_items
        .iter()
        .enumerate()
        .map(|(index, value)| item_from_value(index, value))
        .collect::<Result<Vec<_>, _>>()?;

    check_todo_items(&items)?;
    Ok(items)
}

fn item_from_value(index: usize, value: &Value) -> Result<TodoItem, TodoItemError> {
    let object = value
        .as_object()
        .ok_or(TodoItemError::NotAnObject(index))?;

    if let Some(key) = object.keys().find(|k| *k != "value" && *k != "status") {
        return Err(TodoItemError::UnexpectedKey(index, key.clone()));
    }

    let item_value = match object.get("value") {
        None => return Err(TodoItemError::MissingKey(index, "value")),
        Some(Value::String(s)) => s.clone(),
        Some(_) => return Err(TodoItemError::ValueNotString(index)),
    };

    let status = match object.get("status") {
        None => return Err(TodoItemError::MissingKey(index, "status")),
        Some(Value::Bool(b)) => *b,
        Some(_) => return Err(TodoItemError::StatusNotBoolean(index)),
    };

    Ok(TodoItem::new(item_value, status))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_repeated_object_fields() {
        let items = parse_todo_items(&fields(&[
            r#"{"value":"milk","status":false}"#,
            r#"{"value":"eggs","status":true}"#,
        ]))
        .unwrap();
        assert_eq!(
            items,
            vec![TodoItem::new("milk", false), TodoItem::new("eggs", true)]
        );
    }

    #[test]
    fn test_parse_array_field() {
        let items = parse_todo_items(&fields(&[
            r#"[{"value":"a","status":false},{"value":"b","status":false}]"#,
        ]))
        .unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_rejects_empty_sequence() {
        assert_eq!(parse_todo_items(&[]), Err(TodoItemError::Empty));
        assert_eq!(
            parse_todo_items(&fields(&["[]"])),
            Err(TodoItemError::Empty)
        );
    }

    #[test]
    fn test_rejects_missing_keys_with_index() {
        assert_eq!(
            parse_todo_items(&fields(&[
                r#"{"value":"ok","status":true}"#,
                r#"{"status":true}"#,
            ])),
            Err(TodoItemError::MissingKey(1, "value"))
        );
        assert_eq!(
            parse_todo_items(&fields(&[r#"{"value":"x"}"#])),
            Err(TodoItemError::MissingKey(0, "status"))
        );
    }

    #[test]
    fn test_rejects_mistyped_values() {
        assert_eq!(
            parse_todo_items(&fields(&[r#"{"value":5,"status":true}"#])),
            Err(TodoItemError::ValueNotString(0))
        );
        assert_eq!(
            parse_todo_items(&fields(&[r#"{"value":"x","status":"yes"}"#])),
            Err(TodoItemError::StatusNotBoolean(0))
        );
        assert_eq!(
            parse_todo_items(&fields(&[r#""plain""#])),
            Err(TodoItemError::NotAnObject(0))
        );
        assert_eq!(
            parse_todo_items(&fields(&["{not json"])),
            Err(TodoItemError::Unparsable(0))
        );
    }

    #[test]
    fn test_rejects_extra_keys_and_empty_values() {
        assert_eq!(
            parse_todo_items(&fields(&[r#"{"value":"x","status":true,"done":1}"#])),
            Err(TodoItemError::UnexpectedKey(0, "done".to_string()))
        );
        assert_eq!(
            parse_todo_items(&fields(&[r#"{"value":"","status":true}"#])),
            Err(TodoItemError::ValueEmpty(0))
        );
        let long = format!(r#"{{"value":"{}","status":true}}"#, "x".repeat(151));
        assert_eq!(
            parse_todo_items(&[long]),
            Err(TodoItemError::ValueTooLong(0))
        );
    }
}

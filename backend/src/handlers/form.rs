//! Multipart form decoding for notes and todo lists

use axum::extract::Multipart;
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::media::ImageUpload;
use crate::models::{parse_todo_items, Color, NoteInput, TodoListInput};

const IMAGE_FIELD: &str = "image";

/// Text fields and the optional image of a multipart body
#[derive(Debug, Default)]
struct RawForm {
    fields: HashMap<String, Vec<String>>,
    image: Option<ImageUpload>,
}

impl RawForm {
    /// Read every part; text fields outside `allowed` are rejected
    async fn read(mut multipart: Multipart, allowed: &[&str]) -> ApiResult<Self> {
        let mut form = RawForm::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field
                .name()
                .map(str::to_string)
                .ok_or_else(|| ApiError::validation("Form field without a name"))?;

            if name == IMAGE_FIELD {
                if form.image.is_some() {
                    return Err(ApiError::validation("Only one image can be uploaded"));
                }
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;

                // Browsers send an empty part when no file was chosen
                if bytes.is_empty() && file_name.as_deref().map_or(true, str::is_empty) {
                    continue;
                }
                form.image = Some(ImageUpload {
                    file_name: file_name.unwrap_or_else(|| IMAGE_FIELD.to_string()),
                    content_type,
                    bytes,
                });
                continue;
            }

            if !allowed.contains(&name.as_str()) {
                return Err(ApiError::validation(format!(
                    "Unexpected form field '{}'",
                    name
                )));
            }
            let value = field.text().await?;
            form.fields.entry(name).or_default().push(value);
        }

        Ok(form)
    }

    fn single(&mut self, name: &str) -> ApiResult<Option<String>> {
        match self.fields.remove(name) {
            None => Ok(None),
            Some(mut values) if values.len() == 1 => Ok(values.pop()),
            Some(_) => Err(ApiError::validation(format!(
                "The field '{}' was sent more than once",
                name
            ))),
        }
    }

    fn required(&mut self, name: &str) -> ApiResult<String> {
        self.single(name)?
            .ok_or_else(|| ApiError::validation(format!("The field '{}' is required", name)))
    }

    /// An empty value counts as absent
    fn uuid(&mut self, name: &str) -> ApiResult<Option<Uuid>> {
        match self.single(name)? {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => parse_id(name, &value).map(Some),
        }
    }

    fn color(&mut self) -> ApiResult<Color> {
        let raw = self.required("color")?;
        Color::parse(&raw).ok_or_else(|| ApiError::validation("Invalid color value"))
    }

    fn all(&mut self, name: &str) -> Vec<String> {
        self.fields.remove(name).unwrap_or_default()
    }
}

/// Parse a path or form id
pub fn parse_id(name: &str, value: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(value.trim())
        .map_err(|_| ApiError::validation(format!("The {} is not a valid id", name)))
}

/// Decoded `create-Note` / `update-Note` body
#[derive(Debug)]
pub struct NoteForm {
    pub note_id: Option<Uuid>,
    pub input: NoteInput,
    pub image: Option<ImageUpload>,
}

impl NoteForm {
    pub async fn read(multipart: Multipart) -> ApiResult<Self> {
        let mut form = RawForm::read(
            multipart,
            &["noteId", "title", "textContent", "color", "label"],
        )
        .await?;

        Ok(NoteForm {
            note_id: form.uuid("noteId")?,
            input: NoteInput {
                title: form.required("title")?,
                text_content: form.required("textContent")?,
                color: form.color()?,
                label: form.uuid("label")?,
            },
            image: form.image.take(),
        })
    }
}

/// Decoded `create-TodoList` / `update-TodoList` body
#[derive(Debug)]
pub struct TodoListForm {
    pub todo_list_id: Option<Uuid>,
    pub input: TodoListInput,
    pub image: Option<ImageUpload>,
}

impl TodoListForm {
    pub async fn read(multipart: Multipart) -> ApiResult<Self> {
        let mut form = RawForm::read(
            multipart,
            &["todoListId", "title", "todoItems", "color", "label"],
        )
        .await?;

        let todo_list_id = form.uuid("todoListId")?;
        let title = form.required("title")?;
        let todo_items = parse_todo_items(&form.all("todoItems"))?;

        Ok(TodoListForm {
            todo_list_id,
            input: TodoListInput {
                title,
                todo_items,
                color: form.color()?,
                label: form.uuid("label")?,
            },
            image: form.image.take(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> RawForm {
        let mut form = RawForm::default();
        for (name, value) in pairs {
            form.fields
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }
        form
    }

    #[test]
    fn test_single_rejects_duplicates() {
        let mut f = form(&[("title", "a"), ("title", "b")]);
        assert!(f.single("title").is_err());
        assert_eq!(form(&[("title", "a")]).single("title").unwrap().as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_label_counts_as_absent() {
        assert_eq!(form(&[("label", "")]).uuid("label").unwrap(), None);
        assert!(form(&[("label", "abc")]).uuid("label").is_err());

        let id = Uuid::new_v4();
        let raw = id.to_string();
        assert_eq!(
            form(&[("label", raw.as_str())]).uuid("label").unwrap(),
            Some(id)
        );
    }

    #[test]
    fn test_color_is_required_and_checked() {
        assert!(form(&[]).color().is_err());
        assert!(form(&[("color", "#123456")]).color().is_err());
        assert_eq!(form(&[("color", "#0c625d")]).color().unwrap(), Color::Sage);
    }
}

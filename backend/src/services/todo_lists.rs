//! Todo list service

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::{ensure_label_owned, ImageStager};
use crate::error::{ApiError, ApiResult};
use crate::media::ImageUpload;
use crate::models::{check_todo_items, NewTodoList, TodoList, TodoListChanges, TodoListInput};
use crate::storage::{LabelStore, TodoListStore};

const LIST_NOT_FOUND: &str = "Todo list not found";

pub struct TodoListService {
    lists: Arc<dyn TodoListStore>,
    labels: Arc<dyn LabelStore>,
    images: ImageStager,
}

impl TodoListService {
    pub fn new(
        lists: Arc<dyn TodoListStore>,
        labels: Arc<dyn LabelStore>,
        images: ImageStager,
    ) -> Self {
        Self {
            lists,
            labels,
            images,
        }
    }

    fn validate(&self, input: &TodoListInput, image: Option<&ImageUpload>) -> ApiResult<()> {
        input.validate()?;
        check_todo_items(&input.todo_items)?;
        self.images.check(image)
    }

    pub async fn create(
        &self,
        owner: Uuid,
        input: TodoListInput,
        image: Option<ImageUpload>,
    ) -> ApiResult<TodoList> {
        self.validate(&input, image.as_ref())?;
        ensure_label_owned(self.labels.as_ref(), owner, input.label).await?;

        let lists = self.lists.clone();
        let list = self
            .images
            .with_upload(image, move |image_url| async move {
                lists
                    .insert_list(NewTodoList {
                        title: input.title,
                        todo_items: input.todo_items,
                        color: input.color,
                        created_by: owner,
                        label: input.label,
                        image_url,
                    })
                    .await
                    .map_err(ApiError::from)
            })
            .await?;

        tracing::info!(todo_list_id = %list.id, owner = %owner, "Todo list created");
        Ok(list)
    }

    /// Full replacement, same rules as [`NoteService::update`](super::NoteService::update)
    pub async fn update(
        &self,
        owner: Uuid,
        list_id: Uuid,
        input: TodoListInput,
        image: Option<ImageUpload>,
    ) -> ApiResult<TodoList> {
        self.validate(&input, image.as_ref())?;

        let existing = self
            .lists
            .find_list(owner, list_id)
            .await?
            .ok_or_else(|| ApiError::not_found(LIST_NOT_FOUND))?;
        ensure_label_owned(self.labels.as_ref(), owner, input.label).await?;

        let lists = self.lists.clone();
        let list = self
            .images
            .with_upload(image, move |image_url| async move {
                let changes = TodoListChanges {
                    title: input.title,
                    todo_items: input.todo_items,
                    color: input.color,
                    label: input.label,
                    image_url,
                };
                match lists.update_list(owner, list_id, changes).await {
                    Ok(Some(list)) => Ok(list),
                    Ok(None) => Err(ApiError::not_found(LIST_NOT_FOUND)),
                    Err(e) => Err(ApiError::from(e)),
                }
            })
            .await?;

        if existing.image_url != list.image_url {
            self.images.retire(existing.image_url.as_deref()).await?;
        }

        tracing::info!(todo_list_id = %list.id, "Todo list updated");
        Ok(list)
    }

    pub async fn delete(&self, owner: Uuid, list_id: Uuid) -> ApiResult<()> {
        let existing = self
            .lists
            .find_list(owner, list_id)
            .await?
            .ok_or_else(|| ApiError::not_found(LIST_NOT_FOUND))?;

        self.images.retire(existing.image_url.as_deref()).await?;

        if !self.lists.delete_list(owner, list_id).await? {
            return Err(ApiError::not_found(LIST_NOT_FOUND));
        }

        tracing::info!(todo_list_id = %list_id, "Todo list deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MemoryImageStore;
    use crate::models::{Color, TodoItem};
    use crate::storage::MemoryStore;

    fn service(store: &MemoryStore) -> TodoListService {
        TodoListService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            ImageStager::new(Arc::new(MemoryImageStore::new())),
        )
    }

    fn input(items: Vec<TodoItem>) -> TodoListInput {
        TodoListInput {
            title: "Chores".to_string(),
            todo_items: items,
            color: Color::Sage,
            label: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_update_items() {
        let store = MemoryStore::new();
        let service = service(&store);
        let owner = Uuid::new_v4();

        let list = service
            .create(owner, input(vec![TodoItem::new("dishes", false)]), None)
            .await
            .unwrap();
        assert_eq!(list.todo_items.len(), 1);

        let updated = service
            .update(
                owner,
                list.id,
                input(vec![
                    TodoItem::new("dishes", true),
                    TodoItem::new("laundry", false),
                ]),
                None,
            )
            .await
            .unwrap();
        assert_eq!(updated.todo_items[0], TodoItem::new("dishes", true));
        assert_eq!(updated.todo_items.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_items_are_rejected() {
        let store = MemoryStore::new();
        let err = service(&store)
            .create(Uuid::new_v4(), input(vec![]), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_update_and_delete_of_missing_list() {
        let store = MemoryStore::new();
        let service = service(&store);
        let owner = Uuid::new_v4();

        assert!(matches!(
            service
                .update(owner, Uuid::new_v4(), input(vec![TodoItem::new("x", false)]), None)
                .await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            service.delete(owner, Uuid::new_v4()).await,
            Err(ApiError::NotFound(_))
        ));
    }
}

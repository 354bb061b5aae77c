//! Business logic services for Notekeeper

mod images;
mod labels;
mod notes;
mod todo_lists;

pub use images::ImageStager;
pub use labels::LabelService;
pub use notes::NoteService;
pub use todo_lists::TodoListService;

use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::storage::LabelStore;

/// A label may only be attached by its owner
async fn ensure_label_owned(
    labels: &dyn LabelStore,
    owner: Uuid,
    label: Option<Uuid>,
) -> ApiResult<()> {
    let Some(label_id) = label else {
        return Ok(());
    };
    match labels.find_label(owner, label_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::InvalidReference("Invalid label ID".to_string())),
    }
}

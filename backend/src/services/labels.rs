//! Label service
//!
//! Labels are referenced by notes and todo lists. Deleting one first clears
//! every reference and only then removes the label, so no document is ever
//! left pointing at a missing label.

use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ApiError, ApiResult};
use crate::models::{CreateLabelRequest, Label, LabelData, UpdateLabelRequest};
use crate::storage::{DetachReport, LabelStore, NoteStore, TodoListStore};

const LABEL_NOT_FOUND: &str = "Label not found";

pub struct LabelService {
    labels: Arc<dyn LabelStore>,
    notes: Arc<dyn NoteStore>,
    lists: Arc<dyn TodoListStore>,
}

impl LabelService {
    pub fn new(
        labels: Arc<dyn LabelStore>,
        notes: Arc<dyn NoteStore>,
        lists: Arc<dyn TodoListStore>,
    ) -> Self {
        Self {
            labels,
            notes,
            lists,
        }
    }

    pub async fn create(&self, owner: Uuid, req: CreateLabelRequest) -> ApiResult<Label> {
        req.validate()?;
        let label = self
            .labels
            .insert_label(owner, req.label_name.trim().to_string())
            .await?;
        tracing::info!(label_id = %label.id, owner = %owner, "Label created");
        Ok(label)
    }

    pub async fn list(&self, owner: Uuid) -> ApiResult<Vec<Label>> {
        Ok(self.labels.list_labels(owner).await?)
    }

    /// Notes and todo lists of `owner` tagged with the label
    pub async fn label_data(&self, owner: Uuid, label_id: Uuid) -> ApiResult<LabelData> {
        self.find(owner, label_id).await?;

        let (notes, todo_lists) = tokio::try_join!(
            self.notes.list_notes_by_label(owner, label_id),
            self.lists.list_lists_by_label(owner, label_id),
        )?;
        Ok(LabelData { notes, todo_lists })
    }

    pub async fn rename(&self, owner: Uuid, req: UpdateLabelRequest) -> ApiResult<Label> {
        req.validate()?;
        self.labels
            .rename_label(owner, req.label_id, req.label_name.trim().to_string())
            .await?
            .ok_or_else(|| ApiError::not_found(LABEL_NOT_FOUND))
    }

    /// Detach the label everywhere, then delete it
    pub async fn delete(&self, owner: Uuid, label_id: Uuid) -> ApiResult<()> {
        self.find(owner, label_id).await?;

        let notes = self.notes.detach_label_from_notes(owner, label_id).await?;
        check_detach("notes", label_id, notes)?;

        let lists = self.lists.detach_label_from_lists(owner, label_id).await?;
        check_detach("todo lists", label_id, lists)?;

        // A concurrent delete may have won in the meantime
        if !self.labels.delete_label(owner, label_id).await? {
            return Err(ApiError::not_found(LABEL_NOT_FOUND));
        }

        tracing::info!(
            label_id = %label_id,
            notes_detached = notes.modified,
            lists_detached = lists.modified,
            "Label deleted"
        );
        Ok(())
    }

    async fn find(&self, owner: Uuid, label_id: Uuid) -> ApiResult<Label> {
        self.labels
            .find_label(owner, label_id)
            .await?
            .ok_or_else(|| ApiError::not_found(LABEL_NOT_FOUND))
    }
}

fn check_detach(kind: &str, label_id: Uuid, report: DetachReport) -> ApiResult<()> {
    if report.silently_failed() {
        tracing::error!(
            label_id = %label_id,
            matched = report.matched,
            "Label detach from {} changed nothing",
            kind
        );
        return Err(ApiError::IntegrityError(format!(
            "Failed to remove the label from its {}",
            kind
        )));
    }
    Ok(())
}

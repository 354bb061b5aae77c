//! Note service

use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::{ensure_label_owned, ImageStager};
use crate::error::{ApiError, ApiResult};
use crate::media::ImageUpload;
use crate::models::{LabelSummary, NewNote, Note, NoteChanges, NoteInput, NoteView};
use crate::storage::{LabelStore, NoteStore};

const NOTE_NOT_FOUND: &str = "Note not found";

pub struct NoteService {
    notes: Arc<dyn NoteStore>,
    labels: Arc<dyn LabelStore>,
    images: ImageStager,
}

impl NoteService {
    pub fn new(notes: Arc<dyn NoteStore>, labels: Arc<dyn LabelStore>, images: ImageStager) -> Self {
        Self {
            notes,
            labels,
            images,
        }
    }

    pub async fn create(
        &self,
        owner: Uuid,
        input: NoteInput,
        image: Option<ImageUpload>,
    ) -> ApiResult<Note> {
        input.validate()?;
        self.images.check(image.as_ref())?;
        ensure_label_owned(self.labels.as_ref(), owner, input.label).await?;

        let notes = self.notes.clone();
        let note = self
            .images
            .with_upload(image, move |image_url| async move {
                notes
                    .insert_note(NewNote {
                        title: input.title,
                        text_content: input.text_content,
                        color: input.color,
                        created_by: owner,
                        label: input.label,
                        image_url,
                    })
                    .await
                    .map_err(ApiError::from)
            })
            .await?;

        tracing::info!(note_id = %note.id, owner = %owner, "Note created");
        Ok(note)
    }

    /// Every note of `owner` with its label resolved
    pub async fn list(&self, owner: Uuid) -> ApiResult<Vec<NoteView>> {
        let (notes, labels) = tokio::try_join!(
            self.notes.list_notes(owner),
            self.labels.list_labels(owner),
        )?;

        let labels: HashMap<Uuid, LabelSummary> = labels
            .iter()
            .map(|label| (label.id, LabelSummary::from(label)))
            .collect();

        Ok(notes
            .into_iter()
            .map(|note| {
                let label_details = note.label.and_then(|id| labels.get(&id).cloned());
                NoteView {
                    note,
                    label_details,
                }
            })
            .collect())
    }

    /// Replace every mutable field of a note.
    ///
    /// An absent label clears the reference and an absent image removes the
    /// stored one.
    pub async fn update(
        &self,
        owner: Uuid,
        note_id: Uuid,
        input: NoteInput,
        image: Option<ImageUpload>,
    ) -> ApiResult<Note> {
        input.validate()?;
        self.images.check(image.as_ref())?;

        let existing = self
            .notes
            .find_note(owner, note_id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOTE_NOT_FOUND))?;
        ensure_label_owned(self.labels.as_ref(), owner, input.label).await?;

        let notes = self.notes.clone();
        let note = self
            .images
            .with_upload(image, move |image_url| async move {
                let changes = NoteChanges {
                    title: input.title,
                    text_content: input.text_content,
                    color: input.color,
                    label: input.label,
                    image_url,
                };
                match notes.update_note(owner, note_id, changes).await {
                    Ok(Some(note)) => Ok(note),
                    Ok(None) => Err(ApiError::not_found(NOTE_NOT_FOUND)),
                    Err(e) => Err(ApiError::from(e)),
                }
            })
            .await?;

        if existing.image_url != note.image_url {
            self.images.retire(existing.image_url.as_deref()).await?;
        }

        tracing::info!(note_id = %note.id, "Note updated");
        Ok(note)
    }

    pub async fn delete(&self, owner: Uuid, note_id: Uuid) -> ApiResult<()> {
        let existing = self
            .notes
            .find_note(owner, note_id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOTE_NOT_FOUND))?;

        self.images.retire(existing.image_url.as_deref()).await?;

        if !self.notes.delete_note(owner, note_id).await? {
            return Err(ApiError::not_found(NOTE_NOT_FOUND));
        }

        tracing::info!(note_id = %note_id, "Note deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::{ImageStore, MemoryImageStore};
    use crate::models::Color;
    use crate::storage::MemoryStore;
    use axum::body::Bytes;

    struct Fixture {
        service: NoteService,
        store: MemoryStore,
        images: MemoryImageStore,
    }

    fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let images = MemoryImageStore::new();
        let service = NoteService::new(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            ImageStager::new(Arc::new(images.clone())),
        );
        Fixture {
            service,
            store,
            images,
        }
    }

    fn input(label: Option<Uuid>) -> NoteInput {
        NoteInput {
            title: "Groceries".to_string(),
            text_content: "milk, eggs".to_string(),
            color: Color::Chalk,
            label,
        }
    }

    fn png() -> ImageUpload {
        ImageUpload {
            file_name: "cat.png".to_string(),
            content_type: Some("image/png".to_string()),
            bytes: Bytes::from_static(b"png"),
        }
    }

    #[tokio::test]
    async fn test_create_rejects_foreign_label() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let bobs_label = f.store.insert_label(bob, "Work".to_string()).await.unwrap();

        let err = f
            .service
            .create(alice, input(Some(bobs_label.id)), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidReference(_)));
    }

    #[tokio::test]
    async fn test_invalid_input_uploads_nothing() {
        let f = fixture();
        let mut bad = input(None);
        bad.title = String::new();

        assert!(f.service.create(Uuid::new_v4(), bad, Some(png())).await.is_err());
        assert!(f.images.stored().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_discards_upload() {
        let f = fixture();
        f.store.fail_document_writes(true);

        let err = f
            .service
            .create(Uuid::new_v4(), input(None), Some(png()))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UpstreamError(_)));
        assert!(f.images.stored().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_and_clears_images() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let created = f.service.create(owner, input(None), Some(png())).await.unwrap();
        let first_url = created.image_url.clone().unwrap();

        let replaced = f
            .service
            .update(owner, created.id, input(None), Some(png()))
            .await
            .unwrap();
        assert_ne!(replaced.image_url.as_deref(), Some(first_url.as_str()));
        assert_eq!(f.images.stored().await.len(), 1);

        let cleared = f
            .service
            .update(owner, created.id, input(None), None)
            .await
            .unwrap();
        assert!(cleared.image_url.is_none());
        assert!(f.images.stored().await.is_empty());
    }

    #[tokio::test]
    async fn test_update_reports_stale_image_failure_after_commit() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let created = f.service.create(owner, input(None), Some(png())).await.unwrap();

        f.images.fail_deletes(true);
        let err = f
            .service
            .update(owner, created.id, input(None), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::UpstreamError(_)));

        let stored = f.store.find_note(owner, created.id).await.unwrap().unwrap();
        assert!(stored.image_url.is_none());
    }

    #[tokio::test]
    async fn test_other_users_notes_are_not_found() {
        let f = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let note = f.service.create(alice, input(None), None).await.unwrap();

        assert!(matches!(
            f.service.update(bob, note.id, input(None), None).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            f.service.delete(bob, note.id).await,
            Err(ApiError::NotFound(_))
        ));
        assert!(f.service.delete(alice, note.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_resolves_label_details() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let label = f.store.insert_label(owner, "Home".to_string()).await.unwrap();
        f.service.create(owner, input(Some(label.id)), None).await.unwrap();
        f.service.create(owner, input(None), None).await.unwrap();

        let views = f.service.list(owner).await.unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(
            views[0].label_details.as_ref().map(|l| l.label_name.as_str()),
            Some("Home")
        );
        assert!(views[1].label_details.is_none());
        assert!(f.service.list(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_removes_image() {
        let f = fixture();
        let owner = Uuid::new_v4();
        let note = f.service.create(owner, input(None), Some(png())).await.unwrap();
        let public_id = f.images.stored().await.remove(0);

        f.service.delete(owner, note.id).await.unwrap();
        assert_eq!(f.images.deleted().await, vec![public_id]);
        // Already gone at the store counts as success
        assert!(f.images.delete("missing").await.is_ok());
    }
}

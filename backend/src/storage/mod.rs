//! Persistence collaborators
//!
//! Services only see the traits below. [`PgStore`] persists to PostgreSQL and
//! [`MemoryStore`] keeps everything in process, for tests and local runs.
//! Every entity lookup is scoped by owner so one user's documents are never
//! reachable through another user's ids.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Label, NewNote, NewTodoList, NewUser, Note, NoteChanges, ProfileChanges, TodoList,
    TodoListChanges, User,
};

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    /// Uniqueness violation
    #[error("{0}")]
    Conflict(String),

    /// A stored row could not be mapped back to a model
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of clearing a label reference across documents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetachReport {
    /// Documents that referenced the label
    pub matched: u64,
    /// Documents whose reference was actually cleared
    pub modified: u64,
}

impl DetachReport {
    /// Matching documents existed but none were changed
    pub fn silently_failed(&self) -> bool {
        self.matched > 0 && self.modified == 0
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user; duplicate username or email yields `StoreError::Conflict`
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Find a user whose username or email matches either argument
    async fn find_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<User>>;

    /// Overwrite the stored refresh token digest; false when the user is gone
    async fn set_refresh_token(&self, id: Uuid, token_hash: Option<String>) -> StoreResult<bool>;

    /// Swap the refresh token digest only if it still equals `current`
    async fn replace_refresh_token(
        &self,
        id: Uuid,
        current: &str,
        next: String,
    ) -> StoreResult<bool>;

    async fn update_password(&self, id: Uuid, password_hash: String) -> StoreResult<bool>;

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges)
        -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait LabelStore: Send + Sync {
    async fn insert_label(&self, owner: Uuid, label_name: String) -> StoreResult<Label>;

    async fn find_label(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Label>>;

    async fn list_labels(&self, owner: Uuid) -> StoreResult<Vec<Label>>;

    async fn rename_label(
        &self,
        owner: Uuid,
        id: Uuid,
        label_name: String,
    ) -> StoreResult<Option<Label>>;

    /// Remove a label; false when it no longer exists
    async fn delete_label(&self, owner: Uuid, id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert_note(&self, note: NewNote) -> StoreResult<Note>;

    async fn find_note(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Note>>;

    /// Notes of one owner, oldest first
    async fn list_notes(&self, owner: Uuid) -> StoreResult<Vec<Note>>;

    async fn list_notes_by_label(&self, owner: Uuid, label: Uuid) -> StoreResult<Vec<Note>>;

    async fn update_note(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: NoteChanges,
    ) -> StoreResult<Option<Note>>;

    async fn delete_note(&self, owner: Uuid, id: Uuid) -> StoreResult<bool>;

    /// Clear `label` on every note of `owner` that references it
    async fn detach_label_from_notes(&self, owner: Uuid, label: Uuid)
        -> StoreResult<DetachReport>;
}

#[async_trait]
pub trait TodoListStore: Send + Sync {
    async fn insert_list(&self, list: NewTodoList) -> StoreResult<TodoList>;

    async fn find_list(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<TodoList>>;

    /// Todo lists of one owner, oldest first
    async fn list_lists(&self, owner: Uuid) -> StoreResult<Vec<TodoList>>;

    async fn list_lists_by_label(&self, owner: Uuid, label: Uuid) -> StoreResult<Vec<TodoList>>;

    async fn update_list(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoListChanges,
    ) -> StoreResult<Option<TodoList>>;

    async fn delete_list(&self, owner: Uuid, id: Uuid) -> StoreResult<bool>;

    /// Clear `label` on every todo list of `owner` that references it
    async fn detach_label_from_lists(&self, owner: Uuid, label: Uuid)
        -> StoreResult<DetachReport>;
}

/// Liveness probe for health checks
#[async_trait]
pub trait StoreHealth: Send + Sync {
    async fn ping(&self) -> StoreResult<()>;
}

//! In-process storage backend

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    DetachReport, LabelStore, NoteStore, StoreError, StoreHealth, StoreResult, TodoListStore,
    UserStore,
};
use crate::models::{
    Label, NewNote, NewTodoList, NewUser, Note, NoteChanges, ProfileChanges, TodoList,
    TodoListChanges, User,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    labels: Vec<Label>,
    notes: Vec<Note>,
    todo_lists: Vec<TodoList>,
}

#[derive(Default)]
struct Faults {
    stall_detach: AtomicBool,
    fail_document_writes: AtomicBool,
}

/// Keeps every table in memory; rows are kept in insertion order.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    faults: Arc<Faults>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make label detach report matches without clearing anything
    pub fn stall_label_detach(&self, stalled: bool) {
        self.faults.stall_detach.store(stalled, Ordering::SeqCst);
    }

    /// Make note and todo-list inserts/updates fail with a database error
    pub fn fail_document_writes(&self, fail: bool) {
        self.faults
            .fail_document_writes
            .store(fail, Ordering::SeqCst);
    }

    fn check_document_write(&self) -> StoreResult<()> {
        if self.faults.fail_document_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database("simulated write failure".to_string()));
        }
        Ok(())
    }

    fn detach_stalled(&self) -> bool {
        self.faults.stall_detach.load(Ordering::SeqCst)
    }
}

fn login_matches(user: &User, username: Option<&str>, email: Option<&str>) -> bool {
    username.map_or(false, |u| user.username == u) || email.map_or(false, |e| user.email == e)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(StoreError::Conflict(
                "The user with this username or email already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            password_hash: user.password_hash,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| login_matches(u, username, email))
            .cloned())
    }

    async fn set_refresh_token(&self, id: Uuid, token_hash: Option<String>) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.refresh_token_hash = token_hash;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn replace_refresh_token(
        &self,
        id: Uuid,
        current: &str,
        next: String,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .users
            .iter_mut()
            .find(|u| u.id == id && u.refresh_token_hash.as_deref() == Some(current))
        {
            Some(user) => {
                user.refresh_token_hash = Some(next);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.users.iter_mut().find(|u| u.id == id) {
            Some(user) => {
                user.password_hash = password_hash;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        if let Some(email) = changes.email.as_deref() {
            if tables.users.iter().any(|u| u.id != id && u.email == email) {
                return Err(StoreError::Conflict(
                    "The email is already in use".to_string(),
                ));
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[async_trait]
impl LabelStore for MemoryStore {
    async fn insert_label(&self, owner: Uuid, label_name: String) -> StoreResult<Label> {
        let now = Utc::now();
        let label = Label {
            id: Uuid::new_v4(),
            label_name,
            created_by: owner,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.labels.push(label.clone());
        Ok(label)
    }

    async fn find_label(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Label>> {
        let tables = self.tables.read().await;
        Ok(tables
            .labels
            .iter()
            .find(|l| l.id == id && l.created_by == owner)
            .cloned())
    }

    async fn list_labels(&self, owner: Uuid) -> StoreResult<Vec<Label>> {
        let tables = self.tables.read().await;
        Ok(tables
            .labels
            .iter()
            .filter(|l| l.created_by == owner)
            .cloned()
            .collect())
    }

    async fn rename_label(
        &self,
        owner: Uuid,
        id: Uuid,
        label_name: String,
    ) -> StoreResult<Option<Label>> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .labels
            .iter_mut()
            .find(|l| l.id == id && l.created_by == owner)
            .map(|label| {
                label.label_name = label_name;
                label.updated_at = Utc::now();
                label.clone()
            }))
    }

    async fn delete_label(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables
            .notes
            .iter()
            .any(|n| n.label == Some(id))
            || tables.todo_lists.iter().any(|t| t.label == Some(id))
        {
            // Mirrors the foreign key on the postgres schema
            return Err(StoreError::Database(
                "label is still referenced".to_string(),
            ));
        }
        let before = tables.labels.len();
        tables
            .labels
            .retain(|l| !(l.id == id && l.created_by == owner));
        Ok(tables.labels.len() < before)
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn insert_note(&self, note: NewNote) -> StoreResult<Note> {
        self.check_document_write()?;
        let now = Utc::now();
        let note = Note {
            id: Uuid::new_v4(),
            title: note.title,
            text_content: note.text_content,
            color: note.color,
            created_by: note.created_by,
            label: note.label,
            image_url: note.image_url,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.notes.push(note.clone());
        Ok(note)
    }

    async fn find_note(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Note>> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .iter()
            .find(|n| n.id == id && n.created_by == owner)
            .cloned())
    }

    async fn list_notes(&self, owner: Uuid) -> StoreResult<Vec<Note>> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .iter()
            .filter(|n| n.created_by == owner)
            .cloned()
            .collect())
    }

    async fn list_notes_by_label(&self, owner: Uuid, label: Uuid) -> StoreResult<Vec<Note>> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .iter()
            .filter(|n| n.created_by == owner && n.label == Some(label))
            .cloned()
            .collect())
    }

    async fn update_note(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: NoteChanges,
    ) -> StoreResult<Option<Note>> {
        self.check_document_write()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .notes
            .iter_mut()
            .find(|n| n.id == id && n.created_by == owner)
            .map(|note| {
                note.title = changes.title;
                note.text_content = changes.text_content;
                note.color = changes.color;
                note.label = changes.label;
                note.image_url = changes.image_url;
                note.updated_at = Utc::now();
                note.clone()
            }))
    }

    async fn delete_note(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.notes.len();
        tables
            .notes
            .retain(|n| !(n.id == id && n.created_by == owner));
        Ok(tables.notes.len() < before)
    }

    async fn detach_label_from_notes(
        &self,
        owner: Uuid,
        label: Uuid,
    ) -> StoreResult<DetachReport> {
        let stalled = self.detach_stalled();
        let mut tables = self.tables.write().await;
        let mut report = DetachReport::default();
        for note in tables
            .notes
            .iter_mut()
            .filter(|n| n.created_by == owner && n.label == Some(label))
        {
            report.matched += 1;
            if !stalled {
                note.label = None;
                note.updated_at = Utc::now();
                report.modified += 1;
            }
        }
        Ok(report)
    }
}

#[async_trait]
impl TodoListStore for MemoryStore {
    async fn insert_list(&self, list: NewTodoList) -> StoreResult<TodoList> {
        self.check_document_write()?;
        let now = Utc::now();
        let list = TodoList {
            id: Uuid::new_v4(),
            title: list.title,
            todo_items: list.todo_items,
            color: list.color,
            created_by: list.created_by,
            label: list.label,
            image_url: list.image_url,
            created_at: now,
            updated_at: now,
        };
        self.tables.write().await.todo_lists.push(list.clone());
        Ok(list)
    }

    async fn find_list(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<TodoList>> {
        let tables = self.tables.read().await;
        Ok(tables
            .todo_lists
            .iter()
            .find(|t| t.id == id && t.created_by == owner)
            .cloned())
    }

    async fn list_lists(&self, owner: Uuid) -> StoreResult<Vec<TodoList>> {
        let tables = self.tables.read().await;
        Ok(tables
            .todo_lists
            .iter()
            .filter(|t| t.created_by == owner)
            .cloned()
            .collect())
    }

    async fn list_lists_by_label(&self, owner: Uuid, label: Uuid) -> StoreResult<Vec<TodoList>> {
        let tables = self.tables.read().await;
        Ok(tables
            .todo_lists
            .iter()
            .filter(|t| t.created_by == owner && t.label == Some(label))
            .cloned()
            .collect())
    }

    async fn update_list(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoListChanges,
    ) -> StoreResult<Option<TodoList>> {
        self.check_document_write()?;
        let mut tables = self.tables.write().await;
        Ok(tables
            .todo_lists
            .iter_mut()
            .find(|t| t.id == id && t.created_by == owner)
            .map(|list| {
                list.title = changes.title;
                list.todo_items = changes.todo_items;
                list.color = changes.color;
                list.label = changes.label;
                list.image_url = changes.image_url;
                list.updated_at = Utc::now();
                list.clone()
            }))
    }

    async fn delete_list(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.todo_lists.len();
        tables
            .todo_lists
            .retain(|t| !(t.id == id && t.created_by == owner));
        Ok(tables.todo_lists.len() < before)
    }

    async fn detach_label_from_lists(
        &self,
        owner: Uuid,
        label: Uuid,
    ) -> StoreResult<DetachReport> {
        let stalled = self.detach_stalled();
        let mut tables = self.tables.write().await;
        let mut report = DetachReport::default();
        for list in tables
            .todo_lists
            .iter_mut()
            .filter(|t| t.created_by == owner && t.label == Some(label))
        {
            report.matched += 1;
            if !stalled {
                list.label = None;
                list.updated_at = Utc::now();
                report.modified += 1;
            }
        }
        Ok(report)
    }
}

#[async_trait]
impl StoreHealth for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Color;

    fn new_user(name: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            email: format!("{}@x.com", name),
            full_name: name.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn new_note(owner: Uuid, label: Option<Uuid>) -> NewNote {
        NewNote {
            title: "T".to_string(),
            text_content: "body".to_string(),
            color: Color::Chalk,
            created_by: owner,
            label,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_or_email_conflicts() {
        let store = MemoryStore::new();
        store.insert_user(new_user("alice")).await.unwrap();

        let same_name = store.insert_user(new_user("alice")).await;
        assert!(matches!(same_name, Err(StoreError::Conflict(_))));

        let mut same_email = new_user("bob");
        same_email.email = "alice@x.com".to_string();
        assert!(matches!(
            store.insert_user(same_email).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_refresh_token_is_compare_and_swap() {
        let store = MemoryStore::new();
        let user = store.insert_user(new_user("alice")).await.unwrap();

        store
            .set_refresh_token(user.id, Some("first".to_string()))
            .await
            .unwrap();
        assert!(store
            .replace_refresh_token(user.id, "first", "second".to_string())
            .await
            .unwrap());
        assert!(!store
            .replace_refresh_token(user.id, "first", "third".to_string())
            .await
            .unwrap());

        let stored = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(stored.refresh_token_hash.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn test_note_lookups_are_owner_scoped() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let note = store.insert_note(new_note(owner, None)).await.unwrap();

        assert!(store.find_note(stranger, note.id).await.unwrap().is_none());
        assert!(!store.delete_note(stranger, note.id).await.unwrap());
        assert!(store.find_note(owner, note.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_detach_reports_matches_and_modifications() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let label = store.insert_label(owner, "Work".to_string()).await.unwrap();
        store
            .insert_note(new_note(owner, Some(label.id)))
            .await
            .unwrap();
        store
            .insert_note(new_note(owner, Some(label.id)))
            .await
            .unwrap();

        let report = store
            .detach_label_from_notes(owner, label.id)
            .await
            .unwrap();
        assert_eq!(report, DetachReport { matched: 2, modified: 2 });

        let again = store
            .detach_label_from_notes(owner, label.id)
            .await
            .unwrap();
        assert_eq!(again, DetachReport::default());
        assert!(!again.silently_failed());
    }

    #[tokio::test]
    async fn test_referenced_label_cannot_be_removed() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let label = store.insert_label(owner, "Work".to_string()).await.unwrap();
        store
            .insert_note(new_note(owner, Some(label.id)))
            .await
            .unwrap();

        assert!(store.delete_label(owner, label.id).await.is_err());
    }
}

//! PostgreSQL storage backend

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{
    DetachReport, LabelStore, NoteStore, StoreError, StoreHealth, StoreResult, TodoListStore,
    UserStore,
};
use crate::models::{
    Color, Label, NewNote, NewTodoList, NewUser, Note, NoteChanges, ProfileChanges, TodoItem,
    TodoList, TodoListChanges, User,
};

const USER_COLUMNS: &str =
    "id, username, email, full_name, password_hash, refresh_token_hash, created_at, updated_at";
const LABEL_COLUMNS: &str = "id, label_name, created_by, created_at, updated_at";
const NOTE_COLUMNS: &str =
    "id, title, text_content, color, created_by, label, image_url, created_at, updated_at";
const LIST_COLUMNS: &str =
    "id, title, todo_items, color, created_by, label, image_url, created_at, updated_at";

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(
                    "The user with this username or email already exists".to_string(),
                );
            }
        }
        StoreError::Database(err.to_string())
    }
}

// Database row structures

#[derive(Debug, FromRow)]
struct NoteRow {
    id: Uuid,
    title: String,
    text_content: String,
    color: String,
    created_by: Uuid,
    label: Option<Uuid>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct TodoListRow {
    id: Uuid,
    title: String,
    todo_items: Json<Vec<TodoItem>>,
    color: String,
    created_by: Uuid,
    label: Option<Uuid>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_color(raw: &str) -> StoreResult<Color> {
    Color::parse(raw).ok_or_else(|| StoreError::Corrupt(format!("unknown color '{}'", raw)))
}

impl TryFrom<NoteRow> for Note {
    type Error = StoreError;

    fn try_from(row: NoteRow) -> StoreResult<Self> {
        Ok(Note {
            id: row.id,
            title: row.title,
            text_content: row.text_content,
            color: parse_color(&row.color)?,
            created_by: row.created_by,
            label: row.label,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<TodoListRow> for TodoList {
    type Error = StoreError;

    fn try_from(row: TodoListRow) -> StoreResult<Self> {
        Ok(TodoList {
            id: row.id,
            title: row.title,
            todo_items: row.todo_items.0,
            color: parse_color(&row.color)?,
            created_by: row.created_by,
            label: row.label,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// PostgreSQL-backed implementation of every store trait
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Count documents referencing a label, then clear the reference.
    async fn detach(&self, table: &str, owner: Uuid, label: Uuid) -> StoreResult<DetachReport> {
        let matched: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE created_by = $1 AND label = $2",
            table
        ))
        .bind(owner)
        .bind(label)
        .fetch_one(&self.pool)
        .await?;

        let modified = sqlx::query(&format!(
            "UPDATE {} SET label = NULL, updated_at = NOW() WHERE created_by = $1 AND label = $2",
            table
        ))
        .bind(owner)
        .bind(label)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(DetachReport {
            matched: matched.max(0) as u64,
            modified,
        })
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let created: User = sqlx::query_as(&format!(
            r#"
            INSERT INTO users (id, username, email, full_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_login(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> StoreResult<Option<User>> {
        let user = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE username = $1 OR email = $2 LIMIT 1",
            USER_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_refresh_token(&self, id: Uuid, token_hash: Option<String>) -> StoreResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE users SET refresh_token_hash = $1, updated_at = NOW() WHERE id = $2
            "#,
        )
        .bind(token_hash)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn replace_refresh_token(
        &self,
        id: Uuid,
        current: &str,
        next: String,
    ) -> StoreResult<bool> {
        // Only one concurrent refresh can win the swap
        let rows_affected = sqlx::query(
            r#"
            UPDATE users SET refresh_token_hash = $1, updated_at = NOW()
            WHERE id = $2 AND refresh_token_hash = $3
            "#,
        )
        .bind(next)
        .bind(id)
        .bind(current)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn update_password(&self, id: Uuid, password_hash: String) -> StoreResult<bool> {
        let rows_affected = sqlx::query(
            r#"
            UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(rows_affected > 0)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> StoreResult<Option<User>> {
        let user = sqlx::query_as(&format!(
            r#"
            UPDATE users
            SET email = COALESCE($1, email),
                full_name = COALESCE($2, full_name),
                updated_at = NOW()
            WHERE id = $3
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(changes.email)
        .bind(changes.full_name)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict("The email is already in use".to_string()),
            other => other,
        })?;
        Ok(user)
    }
}

#[async_trait]
impl LabelStore for PgStore {
    async fn insert_label(&self, owner: Uuid, label_name: String) -> StoreResult<Label> {
        let label = sqlx::query_as(&format!(
            r#"
            INSERT INTO labels (id, label_name, created_by)
            VALUES ($1, $2, $3)
            RETURNING {}
            "#,
            LABEL_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(label_name)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;
        Ok(label)
    }

    async fn find_label(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Label>> {
        let label = sqlx::query_as(&format!(
            "SELECT {} FROM labels WHERE id = $1 AND created_by = $2",
            LABEL_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(label)
    }

    async fn list_labels(&self, owner: Uuid) -> StoreResult<Vec<Label>> {
        let labels = sqlx::query_as(&format!(
            "SELECT {} FROM labels WHERE created_by = $1 ORDER BY created_at ASC",
            LABEL_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(labels)
    }

    async fn rename_label(
        &self,
        owner: Uuid,
        id: Uuid,
        label_name: String,
    ) -> StoreResult<Option<Label>> {
        let label = sqlx::query_as(&format!(
            r#"
            UPDATE labels SET label_name = $1, updated_at = NOW()
            WHERE id = $2 AND created_by = $3
            RETURNING {}
            "#,
            LABEL_COLUMNS
        ))
        .bind(label_name)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        Ok(label)
    }

    async fn delete_label(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM labels WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }
}

#[async_trait]
impl NoteStore for PgStore {
    async fn insert_note(&self, note: NewNote) -> StoreResult<Note> {
        let row: NoteRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO notes (id, title, text_content, color, created_by, label, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&note.title)
        .bind(&note.text_content)
        .bind(note.color.as_str())
        .bind(note.created_by)
        .bind(note.label)
        .bind(&note.image_url)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn find_note(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<Note>> {
        let row: Option<NoteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM notes WHERE id = $1 AND created_by = $2",
            NOTE_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Note::try_from).transpose()
    }

    async fn list_notes(&self, owner: Uuid) -> StoreResult<Vec<Note>> {
        let rows: Vec<NoteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM notes WHERE created_by = $1 ORDER BY created_at ASC",
            NOTE_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn list_notes_by_label(&self, owner: Uuid, label: Uuid) -> StoreResult<Vec<Note>> {
        let rows: Vec<NoteRow> = sqlx::query_as(&format!(
            "SELECT {} FROM notes WHERE created_by = $1 AND label = $2 ORDER BY created_at ASC",
            NOTE_COLUMNS
        ))
        .bind(owner)
        .bind(label)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn update_note(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: NoteChanges,
    ) -> StoreResult<Option<Note>> {
        let row: Option<NoteRow> = sqlx::query_as(&format!(
            r#"
            UPDATE notes
            SET title = $1, text_content = $2, color = $3, label = $4, image_url = $5,
                updated_at = NOW()
            WHERE id = $6 AND created_by = $7
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(&changes.title)
        .bind(&changes.text_content)
        .bind(changes.color.as_str())
        .bind(changes.label)
        .bind(&changes.image_url)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Note::try_from).transpose()
    }

    async fn delete_note(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let rows_affected = sqlx::query("DELETE FROM notes WHERE id = $1 AND created_by = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(rows_affected > 0)
    }

    async fn detach_label_from_notes(
        &self,
        owner: Uuid,
        label: Uuid,
    ) -> StoreResult<DetachReport> {
        self.detach("notes", owner, label).await
    }
}

#[async_trait]
impl TodoListStore for PgStore {
    async fn insert_list(&self, list: NewTodoList) -> StoreResult<TodoList> {
        let row: TodoListRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO todo_lists (id, title, todo_items, color, created_by, label, image_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            LIST_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&list.title)
        .bind(Json(&list.todo_items))
        .bind(list.color.as_str())
        .bind(list.created_by)
        .bind(list.label)
        .bind(&list.image_url)
        .fetch_one(&self.pool)
        .await?;
        row.try_into()
    }

    async fn find_list(&self, owner: Uuid, id: Uuid) -> StoreResult<Option<TodoList>> {
        let row: Option<TodoListRow> = sqlx::query_as(&format!(
            "SELECT {} FROM todo_lists WHERE id = $1 AND created_by = $2",
            LIST_COLUMNS
        ))
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TodoList::try_from).transpose()
    }

    async fn list_lists(&self, owner: Uuid) -> StoreResult<Vec<TodoList>> {
        let rows: Vec<TodoListRow> = sqlx::query_as(&format!(
            "SELECT {} FROM todo_lists WHERE created_by = $1 ORDER BY created_at ASC",
            LIST_COLUMNS
        ))
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn list_lists_by_label(&self, owner: Uuid, label: Uuid) -> StoreResult<Vec<TodoList>> {
        let rows: Vec<TodoListRow> = sqlx::query_as(&format!(
            "SELECT {} FROM todo_lists WHERE created_by = $1 AND label = $2 ORDER BY created_at ASC",
            LIST_COLUMNS
        ))
        .bind(owner)
        .bind(label)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    async fn update_list(
        &self,
        owner: Uuid,
        id: Uuid,
        changes: TodoListChanges,
    ) -> StoreResult<Option<TodoList>> {
        let row: Option<TodoListRow> = sqlx::query_as(&format!(
            r#"
            UPDATE todo_lists
            SET title = $1, todo_items = $2, color = $3, label = $4, image_url = $5,
                updated_at = NOW()
            WHERE id = $6 AND created_by = $7
            RETURNING {}
            "#,
            LIST_COLUMNS
        ))
        .bind(&changes.title)
        .bind(Json(&changes.todo_items))
        .bind(changes.color.as_str())
        .bind(changes.label)
        .bind(&changes.image_url)
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;
        row.map(TodoList::try_from).transpose()
    }

    async fn delete_list(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let rows_affected =
            sqlx::query("DELETE FROM todo_lists WHERE id = $1 AND created_by = $2")
                .bind(id)
                .bind(owner)
                .execute(&self.pool)
                .await?
                .rows_affected();
        Ok(rows_affected > 0)
    }

    async fn detach_label_from_lists(
        &self,
        owner: Uuid,
        label: Uuid,
    ) -> StoreResult<DetachReport> {
        self.detach("todo_lists", owner, label).await
    }
}

#[async_trait]
impl StoreHealth for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

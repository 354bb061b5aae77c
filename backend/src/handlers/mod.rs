//! API handlers for the Notekeeper backend

mod form;
pub mod health;
pub mod labels;
pub mod notes;
pub mod todo_lists;
pub mod users;

pub use form::{NoteForm, TodoListForm};

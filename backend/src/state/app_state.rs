//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::{AuthService, PasswordHasher, SessionGuard, TokenService};
use crate::config::Config;
use crate::media::ImageStore;
use crate::services::{ImageStager, LabelService, NoteService, TodoListService};
use crate::storage::{LabelStore, NoteStore, StoreHealth, TodoListStore, UserStore};

/// Storage collaborators, one handle per concern
#[derive(Clone)]
pub struct Backends {
    pub users: Arc<dyn UserStore>,
    pub labels: Arc<dyn LabelStore>,
    pub notes: Arc<dyn NoteStore>,
    pub lists: Arc<dyn TodoListStore>,
    pub health: Arc<dyn StoreHealth>,
}

impl Backends {
    /// Use a single store for every concern
    pub fn from_store<T>(store: T) -> Self
    where
        T: UserStore + LabelStore + NoteStore + TodoListStore + StoreHealth + 'static,
    {
        let store = Arc::new(store);
        Self {
            users: store.clone(),
            labels: store.clone(),
            notes: store.clone(),
            lists: store.clone(),
            health: store,
        }
    }
}

/// Attributes applied to the auth cookies
#[derive(Debug, Clone, Copy)]
pub struct CookieSettings {
    pub secure: bool,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub session_guard: Arc<SessionGuard>,
    pub note_service: Arc<NoteService>,
    pub todo_list_service: Arc<TodoListService>,
    pub label_service: Arc<LabelService>,
    pub health: Arc<dyn StoreHealth>,
    pub cookies: CookieSettings,
}

impl AppState {
    /// Wire services on top of the given collaborators
    pub fn new(backends: Backends, images: Arc<dyn ImageStore>, config: &Config) -> Self {
        let tokens = Arc::new(TokenService::new(backends.users.clone(), config));
        let stager = ImageStager::new(images);

        let auth_service = Arc::new(AuthService::new(
            backends.users.clone(),
            backends.notes.clone(),
            backends.lists.clone(),
            backends.labels.clone(),
            tokens.clone(),
            PasswordHasher::new(config.bcrypt_cost),
        ));
        let session_guard = Arc::new(SessionGuard::new(tokens, backends.users.clone()));
        let note_service = Arc::new(NoteService::new(
            backends.notes.clone(),
            backends.labels.clone(),
            stager.clone(),
        ));
        let todo_list_service = Arc::new(TodoListService::new(
            backends.lists.clone(),
            backends.labels.clone(),
            stager,
        ));
        let label_service = Arc::new(LabelService::new(
            backends.labels,
            backends.notes,
            backends.lists,
        ));

        Self {
            auth_service,
            session_guard,
            note_service,
            todo_list_service,
            label_service,
            health: backends.health,
            cookies: CookieSettings {
                secure: config.cookie_secure,
            },
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}

impl FromRef<AppState> for Arc<SessionGuard> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.session_guard.clone()
    }
}

impl FromRef<AppState> for Arc<NoteService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.note_service.clone()
    }
}

impl FromRef<AppState> for Arc<TodoListService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.todo_list_service.clone()
    }
}

impl FromRef<AppState> for Arc<LabelService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.label_service.clone()
    }
}

impl FromRef<AppState> for Arc<dyn StoreHealth> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.health.clone()
    }
}

impl FromRef<AppState> for CookieSettings {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.cookies
    }
}

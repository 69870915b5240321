//! Application state shared across handlers.

use crate::application::ApplicationRepository;
use crate::auth::{AuthService, AuthState, RefreshSessionStore};
use crate::db::Database;
use crate::project::ProjectRepository;
use crate::user::UserRepository;

/// Shared state: repositories plus the auth core.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub auth_service: AuthService,
    pub users: UserRepository,
    pub projects: ProjectRepository,
    pub applications: ApplicationRepository,
}

impl AppState {
    /// Wire up repositories and the auth core over one database.
    pub fn new(db: &Database, auth: AuthState) -> Self {
        let users = UserRepository::new(db.pool().clone());
        let sessions = RefreshSessionStore::new(db.pool().clone());
        let auth_service = AuthService::new(users.clone(), sessions, auth.clone());

        Self {
            auth,
            auth_service,
            users,
            projects: ProjectRepository::new(db.pool().clone()),
            applications: ApplicationRepository::new(db.pool().clone()),
        }
    }
}

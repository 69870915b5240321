//! User accounts: models and persistence.

mod models;
mod repository;

pub use models::{CreateUserRequest, User, UserInfo};
pub use repository::UserRepository;

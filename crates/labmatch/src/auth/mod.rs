//! Authentication and authorization core.
//!
//! Issues short-lived access tokens and rotating refresh tokens, tracks the
//! single valid refresh session per account as a one-way hash, and provides
//! the two-stage request guard pipeline (authentication, then role
//! authorization) that every protected route passes through.

mod claims;
pub mod config;
mod error;
mod middleware;
pub mod session;
mod service;
pub mod tokens;

pub use claims::{Claims, Identity, Role};
pub use config::AuthConfig;
pub use error::AuthError;
pub use middleware::{
    AuthState, CurrentUser, RouteAuthSpec, auth_middleware, bearer_token_from_header,
    require_roles,
};
pub use service::AuthService;
pub use session::RefreshSessionStore;
pub use tokens::{TokenIssuer, TokenPair};

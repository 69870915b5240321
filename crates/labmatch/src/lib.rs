//! labmatch: research-collaboration platform backend.
//!
//! Students apply to professors' projects, professors manage applications,
//! admins manage accounts. The auth core issues short-lived access tokens
//! and rotating refresh tokens, and gates every protected route behind an
//! authentication guard followed by a role authorization guard.

pub mod api;
pub mod application;
pub mod auth;
pub mod db;
pub mod project;
pub mod user;

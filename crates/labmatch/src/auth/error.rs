//! Authentication errors.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Authentication errors.
///
/// Every variant is terminal for the request: nothing is retried internally,
/// each maps to a distinct client-visible status so the client can decide
/// whether to re-signin (401/403 token failures) or surface a permission
/// error.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing authorization header.
    #[error("missing authorization header")]
    MissingAuthHeader,

    /// Invalid authorization header format.
    #[error("invalid authorization header format")]
    InvalidAuthHeader,

    /// Invalid token signature or claims.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Token expired.
    #[error("token expired")]
    TokenExpired,

    /// Signin failed. Unknown email and wrong password collapse into this
    /// one message to avoid account enumeration.
    #[error("access denied")]
    InvalidCredentials,

    /// Signup with an email that already has an account.
    #[error("email already registered")]
    DuplicateEmail,

    /// Cryptographically valid refresh token that does not match the stored
    /// hash: the session was superseded by rotation or cleared by logout.
    #[error("refresh token superseded")]
    TokenMismatch,

    /// Authenticated, but the role is not permitted on this route.
    #[error("insufficient role: {0}")]
    Forbidden(String),

    /// Internal error.
    #[error("internal auth error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct AuthErrorResponse {
    pub error: String,
    pub error_code: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            AuthError::MissingAuthHeader => (StatusCode::UNAUTHORIZED, "missing_auth_header"),
            AuthError::InvalidAuthHeader => (StatusCode::UNAUTHORIZED, "invalid_auth_header"),
            AuthError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "invalid_token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "token_expired"),
            AuthError::InvalidCredentials => (StatusCode::FORBIDDEN, "access_denied"),
            AuthError::DuplicateEmail => (StatusCode::CONFLICT, "duplicate_email"),
            AuthError::TokenMismatch => (StatusCode::FORBIDDEN, "token_mismatch"),
            AuthError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            AuthError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(AuthErrorResponse {
            error: self.to_string(),
            error_code: error_code.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        AuthError::Internal(format!("{err:#}"))
    }
}

//! Request guard pipeline: authentication, then role authorization.

use axum::{
    extract::{FromRequestParts, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{AuthError, Identity, Role, TokenIssuer};

/// Extract a Bearer token from an Authorization header value.
pub fn bearer_token_from_header(header_value: &str) -> Result<&str, AuthError> {
    let mut parts = header_value.split_whitespace();
    let scheme = parts.next().ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let token = parts.next().ok_or(AuthError::InvalidAuthHeader)?;
    if token.is_empty() {
        return Err(AuthError::InvalidAuthHeader);
    }

    if parts.next().is_some() {
        return Err(AuthError::InvalidAuthHeader);
    }

    Ok(token)
}

/// Static per-route authentication metadata, fixed at registration time.
///
/// Consulted by both guards: `Public` routes bypass the whole pipeline,
/// `RequiresRoles` routes pass the authentication guard and then the role
/// check. Read-only at request time.
#[derive(Debug, Clone, Copy)]
pub enum RouteAuthSpec {
    /// No authentication; no identity is attached.
    Public,
    /// Authenticated identity required, with a role from the given set.
    RequiresRoles(&'static [Role]),
}

/// Authentication state shared across the guard layers.
#[derive(Clone)]
pub struct AuthState {
    issuer: Arc<TokenIssuer>,
}

impl AuthState {
    pub fn new(issuer: TokenIssuer) -> Self {
        Self {
            issuer: Arc::new(issuer),
        }
    }

    /// The token issuer behind this state.
    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }
}

/// Authenticated user extracted from request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// Verified identity.
    pub identity: Identity,
}

impl CurrentUser {
    /// Get the user ID.
    pub fn id(&self) -> i64 {
        self.identity.id
    }

    /// Get the user's role.
    pub fn role(&self) -> Role {
        self.identity.role
    }

    /// Get the user's email.
    pub fn email(&self) -> &str {
        &self.identity.email
    }
}

/// Extract authentication from request.
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AuthError::MissingAuthHeader)
    }
}

/// Authentication guard.
///
/// Verifies the `Authorization: Bearer <token>` access token and injects
/// `CurrentUser` into request extensions. Reads only the signing secrets,
/// never the session store: revocation is scoped to refresh tokens, and
/// those are checked in the refresh/logout handlers.
pub async fn auth_middleware(
    State(auth): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;

    let token = bearer_token_from_header(header)?;
    let identity = auth.issuer().verify_access(token)?;

    req.extensions_mut().insert(CurrentUser { identity });

    Ok(next.run(req).await)
}

/// Authorization guard.
///
/// Compares the authenticated identity's role against the route's declared
/// requirement. Pure comparison over the attached claims; no I/O. An absent
/// identity on a non-public route means the authentication guard was not
/// layered in front, which is a registration bug, and is rejected the same
/// way a missing header is.
pub async fn require_roles(
    State(spec): State<RouteAuthSpec>,
    req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let allowed = match spec {
        RouteAuthSpec::Public => return Ok(next.run(req).await),
        RouteAuthSpec::RequiresRoles(roles) => roles,
    };

    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or(AuthError::MissingAuthHeader)?;

    if !allowed.contains(&user.role()) {
        let wanted = allowed
            .iter()
            .map(Role::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        return Err(AuthError::Forbidden(format!("{} role required", wanted)));
    }

    Ok(next.run(req).await)
}

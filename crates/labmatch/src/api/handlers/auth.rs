//! Authentication handlers.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::{AuthError, CurrentUser, Role, TokenPair, bearer_token_from_header};
use crate::user::UserInfo;

/// Signup request.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

/// Signin request.
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

fn validate_signup(request: &SignupRequest) -> Result<(), ApiError> {
    if !request.email.contains('@') || request.email.len() < 3 {
        return Err(ApiError::bad_request("invalid email address"));
    }
    if request.password.len() < 8 {
        return Err(ApiError::bad_request(
            "password must be at least 8 characters",
        ));
    }
    if request.name.trim().is_empty() {
        return Err(ApiError::bad_request("name must not be empty"));
    }
    Ok(())
}

/// Create an account and return the initial token pair.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> ApiResult<impl IntoResponse> {
    validate_signup(&request)?;

    let pair = state
        .auth_service
        .signup(&request.email, &request.password, &request.name, request.role)
        .await?;

    Ok((StatusCode::CREATED, Json(pair)))
}

/// Verify credentials and return a fresh token pair.
#[instrument(skip(state, request), fields(email = %request.email))]
pub async fn signin(
    State(state): State<AppState>,
    Json(request): Json<SigninRequest>,
) -> ApiResult<Json<TokenPair>> {
    let pair = state
        .auth_service
        .signin(&request.email, &request.password)
        .await?;

    Ok(Json(pair))
}

/// Exchange a refresh token for a new pair.
///
/// The route is public as far as the access-token guard is concerned; the
/// presented bearer token is a refresh token, verified here against the
/// refresh secret and the stored session hash.
#[instrument(skip(state, headers))]
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenPair>, AuthError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or(AuthError::MissingAuthHeader)?;
    let token = bearer_token_from_header(header)?;

    let pair = state.auth_service.refresh(token).await?;
    Ok(Json(pair))
}

/// End the current session.
#[instrument(skip(state, user))]
pub async fn logout(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<StatusCode, AuthError> {
    state.auth_service.logout(user.id()).await?;
    Ok(StatusCode::OK)
}

/// Get the authenticated user's profile.
#[instrument(skip(state, user))]
pub async fn me(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<UserInfo>> {
    let db_user = state
        .users
        .get(user.id())
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(db_user.into()))
}

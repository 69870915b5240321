//! Admin account-management handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tracing::{info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::CurrentUser;
use crate::user::UserInfo;

/// List all accounts.
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserInfo>>> {
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(UserInfo::from).collect()))
}

/// Get one account.
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<UserInfo>> {
    let user = state
        .users
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("user not found"))?;

    Ok(Json(user.into()))
}

/// Delete an account.
#[instrument(skip(state, admin), fields(admin_id = admin.id()))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if id == admin.id() {
        return Err(ApiError::bad_request("cannot delete your own account"));
    }

    if !state.users.delete(id).await? {
        return Err(ApiError::not_found("user not found"));
    }

    info!(user_id = id, "account deleted by admin");
    Ok(StatusCode::NO_CONTENT)
}

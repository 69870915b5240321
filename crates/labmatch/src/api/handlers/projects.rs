//! Project handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::auth::CurrentUser;
use crate::project::{CreateProjectRequest, Project, UpdateProjectRequest};

/// List all projects. Visible to every authenticated role.
#[instrument(skip(state))]
pub async fn list_projects(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    Ok(Json(state.projects.list().await?))
}

/// Get a single project.
#[instrument(skip(state))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Project>> {
    let project = state
        .projects
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    Ok(Json(project))
}

/// Create a project owned by the authenticated professor.
#[instrument(skip(state, user, request), fields(owner_id = user.id()))]
pub async fn create_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<CreateProjectRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.title.trim().is_empty() {
        return Err(ApiError::bad_request("title must not be empty"));
    }

    let project = state.projects.create(user.id(), request).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

/// Fetch a project and check that `user` owns it.
async fn owned_project(state: &AppState, user: &CurrentUser, id: i64) -> ApiResult<Project> {
    let project = state
        .projects
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    if project.owner_id != user.id() {
        return Err(ApiError::forbidden("not the project owner"));
    }

    Ok(project)
}

/// Update an owned project.
#[instrument(skip(state, user, request))]
pub async fn update_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(request): Json<UpdateProjectRequest>,
) -> ApiResult<Json<Project>> {
    owned_project(&state, &user, id).await?;

    let updated = state
        .projects
        .update(id, request)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    Ok(Json(updated))
}

/// Delete an owned project.
#[instrument(skip(state, user))]
pub async fn delete_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    owned_project(&state, &user, id).await?;

    state.projects.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! Application handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::application::{Application, ApplicationStatus};
use crate::auth::CurrentUser;

/// Application submission body.
#[derive(Debug, Deserialize, Default)]
pub struct ApplyRequest {
    #[serde(default)]
    pub note: String,
}

/// Decision body: accepted or rejected.
#[derive(Debug, Deserialize)]
pub struct DecisionRequest {
    pub status: ApplicationStatus,
}

/// Apply to a project as the authenticated student.
#[instrument(skip(state, user, request), fields(student_id = user.id()))]
pub async fn apply(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i64>,
    Json(request): Json<ApplyRequest>,
) -> ApiResult<impl IntoResponse> {
    let project = state
        .projects
        .get(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    if !project.open {
        return Err(ApiError::bad_request("project is not accepting applications"));
    }

    if state
        .applications
        .find(project_id, user.id())
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("already applied to this project"));
    }

    let application = state
        .applications
        .create(project_id, user.id(), &request.note)
        .await?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// List the authenticated student's applications.
#[instrument(skip(state, user))]
pub async fn mine(
    State(state): State<AppState>,
    user: CurrentUser,
) -> ApiResult<Json<Vec<Application>>> {
    Ok(Json(state.applications.list_for_student(user.id()).await?))
}

/// List applications to a project the authenticated professor owns.
#[instrument(skip(state, user))]
pub async fn list_for_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(project_id): Path<i64>,
) -> ApiResult<Json<Vec<Application>>> {
    let project = state
        .projects
        .get(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    if project.owner_id != user.id() {
        return Err(ApiError::forbidden("not the project owner"));
    }

    Ok(Json(state.applications.list_for_project(project_id).await?))
}

/// Accept or reject an application to an owned project.
#[instrument(skip(state, user, request))]
pub async fn decide(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(request): Json<DecisionRequest>,
) -> ApiResult<Json<Application>> {
    if request.status == ApplicationStatus::Pending {
        return Err(ApiError::bad_request("decision must be accepted or rejected"));
    }

    let application = state
        .applications
        .get(id)
        .await?
        .ok_or_else(|| ApiError::not_found("application not found"))?;

    let project = state
        .projects
        .get(application.project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("project not found"))?;

    if project.owner_id != user.id() {
        return Err(ApiError::forbidden("not the project owner"));
    }

    let updated = state
        .applications
        .set_status(id, request.status)
        .await?
        .ok_or_else(|| ApiError::not_found("application not found"))?;

    Ok(Json(updated))
}

//! Research projects: models and persistence.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;

/// Project entity from database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Project {
    pub id: i64,
    pub owner_id: i64,
    pub title: String,
    pub summary: String,
    pub open: bool,
    pub created_at: String,
}

/// Request to create a project.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    #[serde(default)]
    pub summary: String,
}

/// Request to update a project. Absent fields are left unchanged.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateProjectRequest {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub open: Option<bool>,
}

/// Repository for project database operations.
#[derive(Debug, Clone)]
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a project owned by `owner_id`.
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn create(&self, owner_id: i64, request: CreateProjectRequest) -> Result<Project> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            INSERT INTO projects (owner_id, title, summary)
            VALUES (?, ?, ?)
            RETURNING id, owner_id, title, summary, open, created_at
            "#,
        )
        .bind(owner_id)
        .bind(&request.title)
        .bind(&request.summary)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert project")?;

        Ok(project)
    }

    /// Get a project by ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<Project>> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, owner_id, title, summary, open, created_at
            FROM projects
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch project")?;

        Ok(project)
    }

    /// List all projects, newest first.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Project>> {
        let projects = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, owner_id, title, summary, open, created_at
            FROM projects
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list projects")?;

        Ok(projects)
    }

    /// Apply an update. Returns the updated row, or None if the project
    /// does not exist.
    #[instrument(skip(self, request))]
    pub async fn update(&self, id: i64, request: UpdateProjectRequest) -> Result<Option<Project>> {
        let Some(current) = self.get(id).await? else {
            return Ok(None);
        };

        let title = request.title.unwrap_or(current.title);
        let summary = request.summary.unwrap_or(current.summary);
        let open = request.open.unwrap_or(current.open);

        sqlx::query("UPDATE projects SET title = ?, summary = ?, open = ? WHERE id = ?")
            .bind(&title)
            .bind(&summary)
            .bind(open)
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update project")?;

        self.get(id).await
    }

    /// Delete a project. Returns true if a row was removed.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete project")?;

        Ok(result.rows_affected() > 0)
    }
}

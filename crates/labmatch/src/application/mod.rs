//! Project applications: models and persistence.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use tracing::instrument;

/// Application review status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationStatus::Pending => write!(f, "pending"),
            ApplicationStatus::Accepted => write!(f, "accepted"),
            ApplicationStatus::Rejected => write!(f, "rejected"),
        }
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "accepted" => Ok(ApplicationStatus::Accepted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            _ => Err(format!("unknown application status: {}", s)),
        }
    }
}

impl TryFrom<String> for ApplicationStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Application entity from database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: i64,
    pub project_id: i64,
    pub student_id: i64,
    pub note: String,
    #[sqlx(try_from = "String")]
    pub status: ApplicationStatus,
    pub created_at: String,
}

/// Repository for application database operations.
#[derive(Debug, Clone)]
pub struct ApplicationRepository {
    pool: SqlitePool,
}

impl ApplicationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Submit an application from `student_id` to `project_id`.
    #[instrument(skip(self, note))]
    pub async fn create(&self, project_id: i64, student_id: i64, note: &str) -> Result<Application> {
        let application = sqlx::query_as::<_, Application>(
            r#"
            INSERT INTO applications (project_id, student_id, note)
            VALUES (?, ?, ?)
            RETURNING id, project_id, student_id, note, status, created_at
            "#,
        )
        .bind(project_id)
        .bind(student_id)
        .bind(note)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert application")?;

        Ok(application)
    }

    /// Get an application by ID.
    #[instrument(skip(self))]
    pub async fn get(&self, id: i64) -> Result<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(
            r#"
            SELECT id, project_id, student_id, note, status, created_at
            FROM applications
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch application")?;

        Ok(application)
    }

    /// Find a student's application to a project, if any.
    #[instrument(skip(self))]
    pub async fn find(&self, project_id: i64, student_id: i64) -> Result<Option<Application>> {
        let application = sqlx::query_as::<_, Application>(
            r#"
            SELECT id, project_id, student_id, note, status, created_at
            FROM applications
            WHERE project_id = ? AND student_id = ?
            "#,
        )
        .bind(project_id)
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch application by project and student")?;

        Ok(application)
    }

    /// List a student's applications, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_student(&self, student_id: i64) -> Result<Vec<Application>> {
        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT id, project_id, student_id, note, status, created_at
            FROM applications
            WHERE student_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(student_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list applications for student")?;

        Ok(applications)
    }

    /// List applications to a project, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_project(&self, project_id: i64) -> Result<Vec<Application>> {
        let applications = sqlx::query_as::<_, Application>(
            r#"
            SELECT id, project_id, student_id, note, status, created_at
            FROM applications
            WHERE project_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list applications for project")?;

        Ok(applications)
    }

    /// Record a decision. Returns the updated row, or None if the
    /// application does not exist.
    #[instrument(skip(self))]
    pub async fn set_status(
        &self,
        id: i64,
        status: ApplicationStatus,
    ) -> Result<Option<Application>> {
        sqlx::query("UPDATE applications SET status = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update application status")?;

        self.get(id).await
    }
}

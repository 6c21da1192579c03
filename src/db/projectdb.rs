// db/projectdb.rs
use async_trait::async_trait;
use sqlx::Error;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::projectmodel::Project;

const PROJECT_COLUMNS: &str = r#"
    id, client_id, assigned_freelancer_id, title, description,
    budget, status, work_submitted_at, completion_date,
    created_at, updated_at
"#;

#[async_trait]
pub trait ProjectExt {
    async fn create_project(
        &self,
        client_id: Uuid,
        title: String,
        description: String,
        budget: i64,
    ) -> Result<Project, Error>;

    async fn get_project_by_id(&self, project_id: Uuid) -> Result<Option<Project>, Error>;

    async fn get_open_projects(&self, limit: i64, offset: i64) -> Result<Vec<Project>, Error>;

    async fn get_projects_by_client(&self, client_id: Uuid) -> Result<Vec<Project>, Error>;

    /// Cancel the project. Any freelancer assignment is cleared so that an
    /// assignment only ever exists on in_progress or completed projects.
    async fn cancel_project(&self, project_id: Uuid) -> Result<Project, Error>;

    /// Stamp the freelancer's completion submission on an in-progress project.
    async fn mark_work_submitted(&self, project_id: Uuid) -> Result<Project, Error>;

    /// Mark the project completed and stamp completion_date.
    async fn complete_project(&self, project_id: Uuid) -> Result<Project, Error>;
}

#[async_trait]
impl ProjectExt for DBClient {
    async fn create_project(
        &self,
        client_id: Uuid,
        title: String,
        description: String,
        budget: i64,
    ) -> Result<Project, Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            INSERT INTO projects (client_id, title, description, budget)
            VALUES ($1, $2, $3, $4)
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(client_id)
        .bind(title)
        .bind(description)
        .bind(budget)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_project_by_id(&self, project_id: Uuid) -> Result<Option<Project>, Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE id = $1
            "#
        ))
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_open_projects(&self, limit: i64, offset: i64) -> Result<Vec<Project>, Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE status = 'open'
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_projects_by_client(&self, client_id: Uuid) -> Result<Vec<Project>, Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            SELECT {PROJECT_COLUMNS}
            FROM projects
            WHERE client_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn cancel_project(&self, project_id: Uuid) -> Result<Project, Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET status = 'cancelled',
                assigned_freelancer_id = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn mark_work_submitted(&self, project_id: Uuid) -> Result<Project, Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET work_submitted_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn complete_project(&self, project_id: Uuid) -> Result<Project, Error> {
        sqlx::query_as::<_, Project>(&format!(
            r#"
            UPDATE projects
            SET status = 'completed', completion_date = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {PROJECT_COLUMNS}
            "#
        ))
        .bind(project_id)
        .fetch_one(&self.pool)
        .await
    }
}

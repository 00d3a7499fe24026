//! Repository for the `project_designs` table.

use inkforge_core::types::DbId;
use sqlx::PgPool;

use crate::models::project_design::{NewProjectDesign, ProjectDesign};

const COLUMNS: &str = "id, project_id, design_request_id, image_url, style, body_placement, \
     detail_level, modifier, negative_prompt, description, created_at, updated_at";

/// Provides persistence for designs saved into projects.
pub struct ProjectDesignRepo;

impl ProjectDesignRepo {
    /// Save a design into a project. Fails with a foreign key violation when
    /// the project does not exist.
    pub async fn create(
        pool: &PgPool,
        input: &NewProjectDesign,
    ) -> Result<ProjectDesign, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_designs
                (project_id, design_request_id, image_url, style, body_placement,
                 detail_level, modifier, negative_prompt, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectDesign>(&query)
            .bind(input.project_id)
            .bind(input.design_request_id)
            .bind(&input.image_url)
            .bind(&input.style)
            .bind(&input.body_placement)
            .bind(&input.detail_level)
            .bind(&input.modifier)
            .bind(&input.negative_prompt)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    /// List the designs saved in a project, newest first.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<ProjectDesign>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM project_designs
             WHERE project_id = $1
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, ProjectDesign>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    /// Remove a saved design. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, project_id: DbId, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_designs WHERE id = $1 AND project_id = $2")
            .bind(id)
            .bind(project_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

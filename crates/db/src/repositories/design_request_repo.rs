//! Repository for the `design_requests` table.
//!
//! Every status write is a single guarded `UPDATE`: the `WHERE` clause only
//! matches rows whose current status is an allowed predecessor of the target
//! status, so concurrent writers (submit flow, webhook, reconciler) can never
//! move a row backwards or out of a terminal state. Methods return `None`
//! when the guard did not match.

use inkforge_core::design_request::DesignRequestStatus;
use inkforge_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::design_request::{CreateDesignRequest, DesignRequest};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, style, body_placement, detail_level, modifier, negative_prompt, \
     description, reference_image_url, freestyle_drawing_url, external_job_id, \
     generated_image_url, status_id, created_at, updated_at";

/// Provides persistence operations for design requests.
pub struct DesignRequestRepo;

impl DesignRequestRepo {
    /// Insert a new design request in `pending`, returning the created row.
    pub async fn create(
        pool: &PgPool,
        input: &CreateDesignRequest,
    ) -> Result<DesignRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO design_requests
                (style, body_placement, detail_level, modifier, negative_prompt,
                 description, reference_image_url, freestyle_drawing_url, status_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DesignRequest>(&query)
            .bind(&input.style)
            .bind(&input.body_placement)
            .bind(&input.detail_level)
            .bind(&input.modifier)
            .bind(&input.negative_prompt)
            .bind(&input.description)
            .bind(&input.reference_image_url)
            .bind(&input.freestyle_drawing_url)
            .bind(DesignRequestStatus::Pending.id())
            .fetch_one(pool)
            .await
    }

    /// Find a design request by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DesignRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM design_requests WHERE id = $1");
        sqlx::query_as::<_, DesignRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the design request a provider job belongs to.
    pub async fn find_by_job_id(
        pool: &PgPool,
        job_id: &str,
    ) -> Result<Option<DesignRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM design_requests WHERE external_job_id = $1");
        sqlx::query_as::<_, DesignRequest>(&query)
            .bind(job_id)
            .fetch_optional(pool)
            .await
    }

    /// List design requests, most recently created first.
    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DesignRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM design_requests
             ORDER BY created_at DESC, id DESC
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, DesignRequest>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Move a row into `to` if its current status is an allowed predecessor.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        to: DesignRequestStatus,
    ) -> Result<Option<DesignRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE design_requests SET status_id = $2
             WHERE id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DesignRequest>(&query)
            .bind(id)
            .bind(to.id())
            .bind(to.predecessor_ids())
            .fetch_optional(pool)
            .await
    }

    /// Record the provider job id and move the row to `generating`.
    ///
    /// The job id is write-once: rows that already carry one never match.
    pub async fn record_submission(
        pool: &PgPool,
        id: DbId,
        job_id: &str,
    ) -> Result<Option<DesignRequest>, sqlx::Error> {
        let to = DesignRequestStatus::Generating;
        let query = format!(
            "UPDATE design_requests SET external_job_id = $2, status_id = $3
             WHERE id = $1 AND external_job_id IS NULL AND status_id = ANY($4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DesignRequest>(&query)
            .bind(id)
            .bind(job_id)
            .bind(to.id())
            .bind(to.predecessor_ids())
            .fetch_optional(pool)
            .await
    }

    /// Compensating write for a submit flow that ended before a job id was
    /// recorded. Never touches rows that already belong to a provider job.
    pub async fn fail_unsubmitted(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<DesignRequest>, sqlx::Error> {
        let query = format!(
            "UPDATE design_requests SET status_id = $2
             WHERE id = $1 AND external_job_id IS NULL AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DesignRequest>(&query)
            .bind(id)
            .bind(DesignRequestStatus::Failed.id())
            .bind(vec![
                DesignRequestStatus::Pending.id(),
                DesignRequestStatus::Processing.id(),
            ])
            .fetch_optional(pool)
            .await
    }

    /// Mark the row owning `job_id` as `completed` with its output URL.
    pub async fn complete_by_job_id(
        pool: &PgPool,
        job_id: &str,
        generated_image_url: &str,
    ) -> Result<Option<DesignRequest>, sqlx::Error> {
        let to = DesignRequestStatus::Completed;
        let query = format!(
            "UPDATE design_requests SET status_id = $2, generated_image_url = $3
             WHERE external_job_id = $1 AND status_id = ANY($4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DesignRequest>(&query)
            .bind(job_id)
            .bind(to.id())
            .bind(generated_image_url)
            .bind(to.predecessor_ids())
            .fetch_optional(pool)
            .await
    }

    /// Mark the row owning `job_id` as `failed`, leaving the output URL alone.
    pub async fn fail_by_job_id(
        pool: &PgPool,
        job_id: &str,
    ) -> Result<Option<DesignRequest>, sqlx::Error> {
        let to = DesignRequestStatus::Failed;
        let query = format!(
            "UPDATE design_requests SET status_id = $2
             WHERE external_job_id = $1 AND status_id = ANY($3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DesignRequest>(&query)
            .bind(job_id)
            .bind(to.id())
            .bind(to.predecessor_ids())
            .fetch_optional(pool)
            .await
    }

    /// Rows in any of `statuses` that have not changed since `updated_before`,
    /// oldest first.
    pub async fn list_stale(
        pool: &PgPool,
        statuses: &[DesignRequestStatus],
        updated_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<DesignRequest>, sqlx::Error> {
        let ids: Vec<i16> = statuses.iter().map(|s| s.id()).collect();
        let query = format!(
            "SELECT {COLUMNS} FROM design_requests
             WHERE status_id = ANY($1) AND updated_at < $2
             ORDER BY updated_at ASC
             LIMIT $3"
        );
        sqlx::query_as::<_, DesignRequest>(&query)
            .bind(ids)
            .bind(updated_before)
            .bind(limit)
            .fetch_all(pool)
            .await
    }
}

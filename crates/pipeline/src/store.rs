//! Persistence seam for design requests.
//!
//! Every status write returns `None` when its guard did not match, either
//! because the row does not exist or because it is past the point where
//! that write is allowed.

use async_trait::async_trait;
use inkforge_core::design_request::DesignRequestStatus;
use inkforge_core::types::{DbId, Timestamp};
use inkforge_db::models::design_request::{CreateDesignRequest, DesignRequest};
use inkforge_db::repositories::DesignRequestRepo;
use inkforge_db::DbPool;

use crate::error::StoreError;

#[async_trait]
pub trait DesignRequestStore: Send + Sync + 'static {
    async fn create(&self, input: &CreateDesignRequest) -> Result<DesignRequest, StoreError>;

    async fn find_by_id(&self, id: DbId) -> Result<Option<DesignRequest>, StoreError>;

    async fn find_by_job_id(&self, job_id: &str) -> Result<Option<DesignRequest>, StoreError>;

    /// Most recently created first.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<DesignRequest>, StoreError>;

    /// Forward-only status move guarded by the allowed predecessors of `to`.
    async fn transition(
        &self,
        id: DbId,
        to: DesignRequestStatus,
    ) -> Result<Option<DesignRequest>, StoreError>;

    /// Set the write-once job id and move to `generating`.
    async fn record_submission(
        &self,
        id: DbId,
        job_id: &str,
    ) -> Result<Option<DesignRequest>, StoreError>;

    /// Mark `failed` only while no job id has been recorded.
    async fn fail_unsubmitted(&self, id: DbId) -> Result<Option<DesignRequest>, StoreError>;

    async fn complete_by_job_id(
        &self,
        job_id: &str,
        generated_image_url: &str,
    ) -> Result<Option<DesignRequest>, StoreError>;

    async fn fail_by_job_id(&self, job_id: &str) -> Result<Option<DesignRequest>, StoreError>;

    /// Rows in `statuses` untouched since `updated_before`, oldest first.
    async fn list_stale(
        &self,
        statuses: &[DesignRequestStatus],
        updated_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<DesignRequest>, StoreError>;
}

/// PostgreSQL-backed store delegating to [`DesignRequestRepo`].
#[derive(Clone)]
pub struct PgDesignRequestStore {
    pool: DbPool,
}

impl PgDesignRequestStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DesignRequestStore for PgDesignRequestStore {
    async fn create(&self, input: &CreateDesignRequest) -> Result<DesignRequest, StoreError> {
        Ok(DesignRequestRepo::create(&self.pool, input).await?)
    }

    async fn find_by_id(&self, id: DbId) -> Result<Option<DesignRequest>, StoreError> {
        Ok(DesignRequestRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_job_id(&self, job_id: &str) -> Result<Option<DesignRequest>, StoreError> {
        Ok(DesignRequestRepo::find_by_job_id(&self.pool, job_id).await?)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<DesignRequest>, StoreError> {
        Ok(DesignRequestRepo::list(&self.pool, limit, offset).await?)
    }

    async fn transition(
        &self,
        id: DbId,
        to: DesignRequestStatus,
    ) -> Result<Option<DesignRequest>, StoreError> {
        Ok(DesignRequestRepo::transition(&self.pool, id, to).await?)
    }

    async fn record_submission(
        &self,
        id: DbId,
        job_id: &str,
    ) -> Result<Option<DesignRequest>, StoreError> {
        Ok(DesignRequestRepo::record_submission(&self.pool, id, job_id).await?)
    }

    async fn fail_unsubmitted(&self, id: DbId) -> Result<Option<DesignRequest>, StoreError> {
        Ok(DesignRequestRepo::fail_unsubmitted(&self.pool, id).await?)
    }

    async fn complete_by_job_id(
        &self,
        job_id: &str,
        generated_image_url: &str,
    ) -> Result<Option<DesignRequest>, StoreError> {
        Ok(DesignRequestRepo::complete_by_job_id(&self.pool, job_id, generated_image_url).await?)
    }

    async fn fail_by_job_id(&self, job_id: &str) -> Result<Option<DesignRequest>, StoreError> {
        Ok(DesignRequestRepo::fail_by_job_id(&self.pool, job_id).await?)
    }

    async fn list_stale(
        &self,
        statuses: &[DesignRequestStatus],
        updated_before: Timestamp,
        limit: i64,
    ) -> Result<Vec<DesignRequest>, StoreError> {
        Ok(DesignRequestRepo::list_stale(&self.pool, statuses, updated_before, limit).await?)
    }
}

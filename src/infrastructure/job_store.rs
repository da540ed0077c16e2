//! Job status store
//!
//! Single source of truth for job state. Always injected as
//! `Arc<dyn JobStore>` so tests can instantiate isolated stores; stages must
//! never mutate a job record outside of `create`/`update`.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::{Job, JobPatch, JobStatus, NewJob};

/// Job store errors.
#[derive(Debug, thiserror::Error)]
pub enum JobStoreError {
    #[error("Job not found: {0}")]
    NotFound(Uuid),

    #[error("Job is {from} and cannot move to {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },
}

/// Job storage interface.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Allocate a new record in `pending`. Always succeeds.
    async fn create(&self, new: NewJob) -> Job;

    /// Read-only snapshot of a job record.
    async fn get(&self, id: Uuid) -> Result<Job, JobStoreError>;

    /// Atomically merge a partial update into the record; a concurrent
    /// reader never observes a half-merged record. Used by a stage that
    /// already owns the job; status transitions are not re-validated here.
    async fn update(&self, id: Uuid, patch: JobPatch) -> Result<Job, JobStoreError>;

    /// Guarded stage entry: validate `status -> target` against
    /// [`JobStatus::valid_transitions`] and apply the patch (with the status
    /// set to `target`) in one step under the write lock. Two concurrent
    /// triggers on the same job therefore race for a single success;
    /// `processing` is never re-enterable from `processing`.
    async fn try_transition(
        &self,
        id: Uuid,
        target: JobStatus,
        patch: JobPatch,
    ) -> Result<Job, JobStoreError>;

    /// All known jobs, in creation order.
    async fn list(&self) -> Vec<Job>;
}

#[derive(Default)]
struct Inner {
    jobs: HashMap<Uuid, Job>,
    order: Vec<Uuid>,
}

/// In-memory job store. State lives for the process lifetime only.
#[derive(Default)]
pub struct InMemoryJobStore {
    inner: RwLock<Inner>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, new: NewJob) -> Job {
        let job = Job::new(new);
        let mut inner = self.inner.write().await;
        inner.order.push(job.id);
        inner.jobs.insert(job.id, job.clone());
        tracing::debug!(job_id = %job.id, department = %job.department, "Job created");
        job
    }

    async fn get(&self, id: Uuid) -> Result<Job, JobStoreError> {
        self.inner
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .ok_or(JobStoreError::NotFound(id))
    }

    async fn update(&self, id: Uuid, patch: JobPatch) -> Result<Job, JobStoreError> {
        let mut inner = self.inner.write().await;
        let job = inner.jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        job.apply(patch);
        Ok(job.clone())
    }

    async fn try_transition(
        &self,
        id: Uuid,
        target: JobStatus,
        patch: JobPatch,
    ) -> Result<Job, JobStoreError> {
        let mut inner = self.inner.write().await;
        let job = inner.jobs.get_mut(&id).ok_or(JobStoreError::NotFound(id))?;
        if !job.status.can_transition_to(&target) {
            return Err(JobStoreError::InvalidTransition {
                from: job.status,
                to: target,
            });
        }
        let mut patch = patch;
        patch.status = Some(target);
        job.apply(patch);
        Ok(job.clone())
    }

    async fn list(&self) -> Vec<Job> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.jobs.get(id).cloned())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Department, JobPatch, JobStatus};

    fn new_job() -> NewJob {
        NewJob {
            url: "https://arts.example.edu/syllabi/".to_string(),
            job_name: Some("test".to_string()),
            department: Department::Arts,
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_pending_record() {
        let store = InMemoryJobStore::new();
        let job = store.create(new_job()).await;
        let fetched = store.get(job.id).await.unwrap();
        assert_eq!(fetched.status, JobStatus::Pending);
        assert_eq!(fetched.id, job.id);
    }

    #[tokio::test]
    async fn get_unknown_id_is_not_found() {
        let store = InMemoryJobStore::new();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, JobStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = InMemoryJobStore::new();
        let err = store
            .update(Uuid::new_v4(), JobPatch::new().progress(10))
            .await
            .unwrap_err();
        assert!(matches!(err, JobStoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn status_reads_are_idempotent() {
        let store = InMemoryJobStore::new();
        let job = store.create(new_job()).await;
        store
            .update(job.id, JobPatch::new().progress(42).message("working"))
            .await
            .unwrap();
        let a = store.get(job.id).await.unwrap();
        let b = store.get(job.id).await.unwrap();
        assert_eq!(a.progress, b.progress);
        assert_eq!(a.message, b.message);
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = InMemoryJobStore::new();
        let first = store.create(new_job()).await;
        let second = store.create(new_job()).await;
        let third = store.create(new_job()).await;
        let ids: Vec<Uuid> = store.list().await.into_iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[tokio::test]
    async fn transition_succeeds_only_once_per_stage_entry() {
        let store = InMemoryJobStore::new();
        let job = store.create(new_job()).await;
        store
            .update(job.id, JobPatch::new().status(JobStatus::Completed))
            .await
            .unwrap();

        let first = store
            .try_transition(job.id, JobStatus::Processing, JobPatch::new().progress(0))
            .await;
        assert!(first.is_ok());

        // The job is now processing; a second entry attempt loses the race.
        let second = store
            .try_transition(job.id, JobStatus::Processing, JobPatch::new().progress(0))
            .await;
        assert!(matches!(
            second,
            Err(JobStoreError::InvalidTransition {
                from: JobStatus::Processing,
                to: JobStatus::Processing
            })
        ));
    }

    #[tokio::test]
    async fn transition_rejects_invalid_source_status() {
        let store = InMemoryJobStore::new();
        let job = store.create(new_job()).await;
        let err = store
            .try_transition(job.id, JobStatus::Processing, JobPatch::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            JobStoreError::InvalidTransition {
                from: JobStatus::Pending,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn progress_regression_is_ignored() {
        let store = InMemoryJobStore::new();
        let job = store.create(new_job()).await;
        store
            .update(job.id, JobPatch::new().status(JobStatus::Downloading).progress(60))
            .await
            .unwrap();
        let after = store
            .update(job.id, JobPatch::new().progress(30))
            .await
            .unwrap();
        assert_eq!(after.progress, 60);
    }
}

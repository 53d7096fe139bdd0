pub mod memory;
pub mod postgres;

use crate::error::Result;
use crate::models::application::{Application, ApplicationSource, ApplicationStatus, CandidateRef};
use crate::models::history::{HistoryEntry, NewHistoryEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub job_id: Uuid,
    pub candidate: CandidateRef,
    pub source: ApplicationSource,
}

/// Scope of a list/aggregation read. `None` means all applications.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub job_ids: Option<Vec<Uuid>>,
}

impl ApplicationFilter {
    pub fn all() -> Self {
        Self { job_ids: None }
    }

    pub fn for_jobs(job_ids: Vec<Uuid>) -> Self {
        Self {
            job_ids: Some(job_ids),
        }
    }

    pub fn matches(&self, job_id: Uuid) -> bool {
        match &self.job_ids {
            Some(ids) => ids.contains(&job_id),
            None => true,
        }
    }
}

/// Persistence contract for application records and their audit logs.
///
/// `create` and `update_status` are atomic units: the record write and its
/// history append both happen or neither does. History is append-only; no
/// method edits or removes an existing entry.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Persist a new application with its implicit initial Status entry.
    async fn create(&self, new_app: NewApplication) -> Result<Application>;

    async fn get(&self, id: Uuid) -> Result<Option<Application>>;

    async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>>;

    /// Overwrite `status` and append the audit entry describing it in one
    /// atomic operation. Fails with `NotFound` for an unknown id.
    async fn update_status(
        &self,
        id: Uuid,
        new_status: ApplicationStatus,
        entry: NewHistoryEntry,
    ) -> Result<Application>;

    /// Append a note or rating entry without touching `status`.
    async fn append_entry(&self, id: Uuid, entry: NewHistoryEntry) -> Result<HistoryEntry>;

    /// Overwrite the stored match score. Only called on explicit recompute.
    async fn set_score(&self, id: Uuid, score: i32) -> Result<Application>;

    /// Full log for one application, in insertion order.
    async fn history(&self, id: Uuid) -> Result<Vec<HistoryEntry>>;

    /// Bulk log read for analytics; missing ids simply have no entry.
    async fn history_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<HistoryEntry>>>;
}

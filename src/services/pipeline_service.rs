use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationSource, ApplicationStatus, CandidateRef,
};
use crate::models::history::{HistoryDetail, HistoryEntry, NewHistoryEntry};
use crate::store::{ApplicationFilter, ApplicationStore, NewApplication};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkFailure {
    pub id: Uuid,
    pub error: String,
}

/// Per-id outcome of a bulk status change. A failed id never aborts the rest
/// of the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkTransitionReport {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<BulkFailure>,
}

/// The state machine governing an application's lifecycle. All writes to an
/// application go through here; the store guarantees each status write lands
/// together with its audit entry.
#[derive(Clone)]
pub struct PipelineService {
    store: Arc<dyn ApplicationStore>,
}

impl PipelineService {
    pub fn new(store: Arc<dyn ApplicationStore>) -> Self {
        Self { store }
    }

    pub async fn create_application(
        &self,
        job_id: Uuid,
        candidate: CandidateRef,
        source: ApplicationSource,
    ) -> Result<Application> {
        if let CandidateRef::External { name, email, .. } = &candidate {
            if name.trim().is_empty() {
                return Err(Error::validation("name", "External candidate name is required"));
            }
            if email.trim().is_empty() {
                return Err(Error::validation(
                    "email",
                    "External candidate email is required",
                ));
            }
        }
        let app = self
            .store
            .create(NewApplication {
                job_id,
                candidate,
                source,
            })
            .await?;
        tracing::info!(application_id = %app.id, job_id = %job_id, "Application created");
        Ok(app)
    }

    pub async fn get_application(&self, id: Uuid) -> Result<Application> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application not found: {}", id)))
    }

    pub async fn list_applications(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        self.store.list(filter).await
    }

    pub async fn get_history(&self, id: Uuid) -> Result<Vec<HistoryEntry>> {
        // Distinguish "no application" from "empty log" (which cannot happen
        // for a real record anyway, creation seeds the log).
        self.get_application(id).await?;
        self.store.history(id).await
    }

    /// Apply a single status change. Forward jumps along the pipeline are
    /// allowed; backward moves and moves out of a terminal status are not.
    /// Re-requesting the current status is an idempotent no-op, so callers
    /// may retry safely after storage errors.
    pub async fn transition(
        &self,
        id: Uuid,
        new_status: ApplicationStatus,
        actor: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<Application> {
        let app = self.get_application(id).await?;

        if app.status == new_status {
            return Ok(app);
        }
        if app.status.is_terminal() {
            return Err(Error::InvalidTransition(format!(
                "Application {} is already {} and cannot change status",
                id, app.status
            )));
        }
        if new_status != ApplicationStatus::Rejected {
            let current_rank = app
                .status
                .stage_rank()
                .expect("non-terminal status always has a rank");
            match new_status.stage_rank() {
                Some(next_rank) if next_rank > current_rank => {}
                _ => {
                    return Err(Error::InvalidTransition(format!(
                        "Cannot move application {} from {} to {}",
                        id, app.status, new_status
                    )))
                }
            }
        }

        tracing::info!(
            application_id = %id,
            from = %app.status,
            to = %new_status,
            "Status transition"
        );
        self.store
            .update_status(
                id,
                new_status,
                NewHistoryEntry {
                    actor,
                    detail: HistoryDetail::Status {
                        status: new_status,
                        notes,
                    },
                },
            )
            .await
    }

    /// Apply `transition` to each id independently; a terminal or unknown id
    /// is reported in `failed` without aborting the rest of the batch.
    pub async fn bulk_transition(
        &self,
        ids: &[Uuid],
        new_status: ApplicationStatus,
        actor: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<BulkTransitionReport> {
        let mut report = BulkTransitionReport {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for &id in ids {
            match self.transition(id, new_status, actor, notes.clone()).await {
                Ok(_) => report.succeeded.push(id),
                Err(e) => report.failed.push(BulkFailure {
                    id,
                    error: e.to_string(),
                }),
            }
        }
        tracing::info!(
            to = %new_status,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Bulk status transition finished"
        );
        Ok(report)
    }

    /// Explicit "mark as read": a first detail view moves Applied to Viewed,
    /// exactly once. Any other status is left untouched.
    pub async fn mark_viewed(&self, id: Uuid, actor: Option<Uuid>) -> Result<Application> {
        let app = self.get_application(id).await?;
        if app.status != ApplicationStatus::Applied {
            return Ok(app);
        }
        self.transition(id, ApplicationStatus::Viewed, actor, None)
            .await
    }

    /// Append a note entry, and a separate rating entry when one is supplied.
    /// The two appends are independent because the rating has its own
    /// last-write-wins lifecycle.
    pub async fn add_note(
        &self,
        id: Uuid,
        content: String,
        tags: Vec<String>,
        rating: Option<i32>,
        actor: Option<Uuid>,
    ) -> Result<Vec<HistoryEntry>> {
        if content.trim().is_empty() {
            return Err(Error::validation("content", "Note content is required"));
        }
        if let Some(r) = rating {
            check_rating(r)?;
        }

        let mut entries = Vec::new();
        let note = self
            .store
            .append_entry(
                id,
                NewHistoryEntry {
                    actor,
                    detail: HistoryDetail::Note { content, tags },
                },
            )
            .await?;
        entries.push(note);

        if let Some(r) = rating {
            let rating_entry = self
                .store
                .append_entry(
                    id,
                    NewHistoryEntry {
                        actor,
                        detail: HistoryDetail::Rating { rating: r },
                    },
                )
                .await?;
            entries.push(rating_entry);
        }
        Ok(entries)
    }

    /// Append a rating entry. Ratings accumulate; the current one is the most
    /// recent entry, not an average.
    pub async fn set_rating(
        &self,
        id: Uuid,
        rating: i32,
        actor: Option<Uuid>,
    ) -> Result<HistoryEntry> {
        check_rating(rating)?;
        self.store
            .append_entry(
                id,
                NewHistoryEntry {
                    actor,
                    detail: HistoryDetail::Rating { rating },
                },
            )
            .await
    }

    /// Persist an externally computed match score. No computation happens
    /// here, and an existing score is only ever replaced by this explicit
    /// call.
    pub async fn record_score(&self, id: Uuid, score: i32) -> Result<Application> {
        if !(0..=100).contains(&score) {
            return Err(Error::validation("score", "Score must be between 0 and 100"));
        }
        let app = self.store.set_score(id, score).await?;
        tracing::info!(application_id = %id, score, "ATS score recorded");
        Ok(app)
    }
}

fn check_rating(rating: i32) -> Result<()> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(Error::validation("rating", "Rating must be between 1 and 5"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::application::ApplicationSource;
    use crate::store::memory::MemoryStore;

    fn service() -> PipelineService {
        PipelineService::new(Arc::new(MemoryStore::new()))
    }

    async fn seed(svc: &PipelineService) -> Application {
        svc.create_application(
            Uuid::new_v4(),
            CandidateRef::External {
                name: "Casey".into(),
                email: "casey@example.com".into(),
                phone: None,
            },
            ApplicationSource::External,
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn forward_jump_is_allowed() {
        let svc = service();
        let app = seed(&svc).await;
        let updated = svc
            .transition(app.id, ApplicationStatus::Shortlisted, None, None)
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Shortlisted);
    }

    #[tokio::test]
    async fn backward_move_is_rejected() {
        let svc = service();
        let app = seed(&svc).await;
        svc.transition(app.id, ApplicationStatus::Interviewed, None, None)
            .await
            .unwrap();
        let err = svc
            .transition(app.id, ApplicationStatus::Screened, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn terminal_state_accepts_no_transition() {
        let svc = service();
        let app = seed(&svc).await;
        svc.transition(app.id, ApplicationStatus::Screened, None, None)
            .await
            .unwrap();
        svc.transition(app.id, ApplicationStatus::Rejected, None, None)
            .await
            .unwrap();
        let err = svc
            .transition(app.id, ApplicationStatus::Shortlisted, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));

        // applied -> screened -> rejected leaves exactly three entries
        let log = svc.get_history(app.id).await.unwrap();
        assert_eq!(log.len(), 3);
    }

    #[tokio::test]
    async fn same_status_transition_is_a_no_op() {
        let svc = service();
        let app = seed(&svc).await;
        svc.transition(app.id, ApplicationStatus::Screened, None, None)
            .await
            .unwrap();
        let before = svc.get_history(app.id).await.unwrap().len();
        let unchanged = svc
            .transition(app.id, ApplicationStatus::Screened, None, None)
            .await
            .unwrap();
        assert_eq!(unchanged.status, ApplicationStatus::Screened);
        assert_eq!(svc.get_history(app.id).await.unwrap().len(), before);
    }

    #[tokio::test]
    async fn rejected_is_reachable_from_any_live_status() {
        let svc = service();
        let app = seed(&svc).await;
        svc.transition(app.id, ApplicationStatus::Interviewed, None, None)
            .await
            .unwrap();
        let updated = svc
            .transition(app.id, ApplicationStatus::Rejected, None, None)
            .await
            .unwrap();
        assert_eq!(updated.status, ApplicationStatus::Rejected);
    }

    #[tokio::test]
    async fn bulk_transition_reports_partial_failure() {
        let svc = service();
        let mut ids = Vec::new();
        for _ in 0..4 {
            ids.push(seed(&svc).await.id);
        }
        let terminal = seed(&svc).await;
        svc.transition(terminal.id, ApplicationStatus::Rejected, None, None)
            .await
            .unwrap();
        ids.push(terminal.id);

        let report = svc
            .bulk_transition(&ids, ApplicationStatus::Screened, None, None)
            .await
            .unwrap();
        assert_eq!(report.succeeded.len(), 4);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].id, terminal.id);
    }

    #[tokio::test]
    async fn mark_viewed_fires_exactly_once() {
        let svc = service();
        let app = seed(&svc).await;
        let viewed = svc.mark_viewed(app.id, None).await.unwrap();
        assert_eq!(viewed.status, ApplicationStatus::Viewed);
        let len_after_first = svc.get_history(app.id).await.unwrap().len();
        assert_eq!(len_after_first, 2);

        // second fetch is a no-op
        let again = svc.mark_viewed(app.id, None).await.unwrap();
        assert_eq!(again.status, ApplicationStatus::Viewed);
        assert_eq!(svc.get_history(app.id).await.unwrap().len(), 2);

        // and a later stage is never pulled back to viewed
        svc.transition(app.id, ApplicationStatus::Interviewed, None, None)
            .await
            .unwrap();
        let later = svc.mark_viewed(app.id, None).await.unwrap();
        assert_eq!(later.status, ApplicationStatus::Interviewed);
    }

    #[tokio::test]
    async fn note_with_rating_appends_two_entries() {
        let svc = service();
        let app = seed(&svc).await;
        let entries = svc
            .add_note(
                app.id,
                "Great systems background".into(),
                vec!["backend".into()],
                Some(4),
                None,
            )
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert!(matches!(entries[0].detail, HistoryDetail::Note { .. }));
        assert!(matches!(
            entries[1].detail,
            HistoryDetail::Rating { rating: 4 }
        ));

        // neither append touched the status
        let app = svc.get_application(app.id).await.unwrap();
        assert_eq!(app.status, ApplicationStatus::Applied);
    }

    #[tokio::test]
    async fn empty_note_content_is_invalid() {
        let svc = service();
        let app = seed(&svc).await;
        let err = svc
            .add_note(app.id, "   ".into(), vec![], None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn latest_rating_wins_and_all_are_kept() {
        let svc = service();
        let app = seed(&svc).await;
        svc.set_rating(app.id, 4, None).await.unwrap();
        svc.set_rating(app.id, 2, None).await.unwrap();

        let ratings: Vec<i32> = svc
            .get_history(app.id)
            .await
            .unwrap()
            .into_iter()
            .filter_map(|e| match e.detail {
                HistoryDetail::Rating { rating } => Some(rating),
                _ => None,
            })
            .collect();
        assert_eq!(ratings, vec![4, 2]);
        assert_eq!(ratings.last(), Some(&2));
    }

    #[tokio::test]
    async fn out_of_range_inputs_are_validation_errors() {
        let svc = service();
        let app = seed(&svc).await;
        assert!(matches!(
            svc.set_rating(app.id, 0, None).await.unwrap_err(),
            Error::Validation(_)
        ));
        assert!(matches!(
            svc.set_rating(app.id, 6, None).await.unwrap_err(),
            Error::Validation(_)
        ));
        assert!(matches!(
            svc.record_score(app.id, 101).await.unwrap_err(),
            Error::Validation(_)
        ));
    }

    #[tokio::test]
    async fn score_is_persisted_not_computed() {
        let svc = service();
        let app = seed(&svc).await;
        assert_eq!(app.score, None);
        let scored = svc.record_score(app.id, 87).await.unwrap();
        assert_eq!(scored.score, Some(87));
        // explicit recompute overwrites
        let rescored = svc.record_score(app.id, 91).await.unwrap();
        assert_eq!(rescored.score, Some(91));
    }

    #[tokio::test]
    async fn unknown_application_is_not_found() {
        let svc = service();
        let err = svc
            .transition(Uuid::new_v4(), ApplicationStatus::Screened, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}

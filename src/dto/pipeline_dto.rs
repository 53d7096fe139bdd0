use crate::models::application::{ApplicationSource, ApplicationStatus, CandidateRef};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateApplicationPayload {
    pub job_id: Uuid,
    pub candidate: CandidateRef,
    /// Defaults from the candidate shape: internal users are internal
    /// applicants, walk-ins are external.
    pub source: Option<ApplicationSource>,
}

impl CreateApplicationPayload {
    pub fn effective_source(&self) -> ApplicationSource {
        self.source.unwrap_or(match self.candidate {
            CandidateRef::Internal { .. } => ApplicationSource::Internal,
            CandidateRef::External { .. } => ApplicationSource::External,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TransitionPayload {
    pub status: ApplicationStatus,
    pub actor: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BulkTransitionPayload {
    #[validate(length(min = 1, message = "At least one application id is required"))]
    pub application_ids: Vec<Uuid>,
    pub status: ApplicationStatus,
    pub actor: Option<Uuid>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddNotePayload {
    #[validate(length(min = 1, message = "Note content is required"))]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: Option<i32>,
    pub actor: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SetRatingPayload {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
    pub actor: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkViewedPayload {
    pub actor: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScoreApplicationPayload {
    #[validate(length(min = 1, message = "Resume text is required"))]
    pub resume: String,
    /// Falls back to the job posting's title when omitted.
    pub job_description: Option<String>,
}

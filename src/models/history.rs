use crate::models::application::ApplicationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of a history entry. Entries are immutable once appended; the
/// "current" note or rating is always the most recent entry of that type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryDetail {
    Status {
        status: ApplicationStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        notes: Option<String>,
    },
    Note {
        content: String,
        tags: Vec<String>,
    },
    Rating {
        rating: i32,
    },
}

impl HistoryDetail {
    pub fn entry_type(&self) -> &'static str {
        match self {
            HistoryDetail::Status { .. } => "status",
            HistoryDetail::Note { .. } => "note",
            HistoryDetail::Rating { .. } => "rating",
        }
    }
}

/// One line of an application's append-only audit log, ordered by insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub application_id: Uuid,
    pub actor: Option<Uuid>,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub detail: HistoryDetail,
}

/// Entry as handed to the store, before id/timestamp assignment.
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub actor: Option<Uuid>,
    pub detail: HistoryDetail,
}

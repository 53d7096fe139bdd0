use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Job posting metadata, owned by the jobs collaborator and read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobMeta {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub title: String,
    pub status: String,
}

impl JobMeta {
    pub fn is_active(&self) -> bool {
        self.status == "open"
    }
}

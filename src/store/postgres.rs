use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus, CandidateRef};
use crate::models::history::{HistoryDetail, HistoryEntry, NewHistoryEntry};
use crate::store::{ApplicationFilter, ApplicationStore, NewApplication};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ApplicationRow {
    id: Uuid,
    job_id: Uuid,
    candidate_user_id: Option<Uuid>,
    external_name: Option<String>,
    external_email: Option<String>,
    external_phone: Option<String>,
    status: String,
    source: String,
    score: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ApplicationRow> for Application {
    type Error = Error;

    fn try_from(row: ApplicationRow) -> Result<Self> {
        let candidate = match (row.candidate_user_id, row.external_name, row.external_email) {
            (Some(user_id), None, None) => CandidateRef::Internal { user_id },
            (None, Some(name), Some(email)) => CandidateRef::External {
                name,
                email,
                phone: row.external_phone,
            },
            _ => {
                return Err(Error::Internal(format!(
                    "Application {} has inconsistent candidate identity",
                    row.id
                )))
            }
        };
        Ok(Application {
            id: row.id,
            job_id: row.job_id,
            candidate,
            status: ApplicationStatus::from_str(&row.status)?,
            source: row.source.parse()?,
            score: row.score,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: Uuid,
    application_id: Uuid,
    actor: Option<Uuid>,
    entry_type: String,
    status: Option<String>,
    notes: Option<String>,
    content: Option<String>,
    tags: Option<JsonValue>,
    rating: Option<i32>,
    created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for HistoryEntry {
    type Error = Error;

    fn try_from(row: HistoryRow) -> Result<Self> {
        let detail = match row.entry_type.as_str() {
            "status" => HistoryDetail::Status {
                status: ApplicationStatus::from_str(row.status.as_deref().ok_or_else(|| {
                    Error::Internal(format!("Status entry {} missing status", row.id))
                })?)?,
                notes: row.notes,
            },
            "note" => HistoryDetail::Note {
                content: row.content.unwrap_or_default(),
                tags: row
                    .tags
                    .map(serde_json::from_value)
                    .transpose()?
                    .unwrap_or_default(),
            },
            "rating" => HistoryDetail::Rating {
                rating: row.rating.ok_or_else(|| {
                    Error::Internal(format!("Rating entry {} missing rating", row.id))
                })?,
            },
            other => {
                return Err(Error::Internal(format!(
                    "Unknown history entry type: {}",
                    other
                )))
            }
        };
        Ok(HistoryEntry {
            id: row.id,
            application_id: row.application_id,
            actor: row.actor,
            timestamp: row.created_at,
            detail,
        })
    }
}

const APPLICATION_COLUMNS: &str = "id, job_id, candidate_user_id, external_name, external_email, \
     external_phone, status, source, score, created_at, updated_at";

const HISTORY_COLUMNS: &str =
    "id, application_id, actor, entry_type, status, notes, content, tags, rating, created_at";

async fn insert_entry(
    tx: &mut Transaction<'_, Postgres>,
    application_id: Uuid,
    entry: &NewHistoryEntry,
) -> Result<HistoryEntry> {
    let (status, notes, content, tags, rating) = match &entry.detail {
        HistoryDetail::Status { status, notes } => (
            Some(status.as_str().to_string()),
            notes.clone(),
            None,
            None,
            None,
        ),
        HistoryDetail::Note { content, tags } => (
            None,
            None,
            Some(content.clone()),
            Some(serde_json::to_value(tags)?),
            None,
        ),
        HistoryDetail::Rating { rating } => (None, None, None, None, Some(*rating)),
    };

    let row = sqlx::query_as::<_, HistoryRow>(&format!(
        r#"
        INSERT INTO application_history
            (id, application_id, actor, entry_type, status, notes, content, tags, rating)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {}
        "#,
        HISTORY_COLUMNS
    ))
    .bind(Uuid::new_v4())
    .bind(application_id)
    .bind(entry.actor)
    .bind(entry.detail.entry_type())
    .bind(status)
    .bind(notes)
    .bind(content)
    .bind(tags)
    .bind(rating)
    .fetch_one(&mut **tx)
    .await?;

    row.try_into()
}

#[async_trait]
impl ApplicationStore for PgStore {
    async fn create(&self, new_app: NewApplication) -> Result<Application> {
        let (user_id, name, email, phone) = match &new_app.candidate {
            CandidateRef::Internal { user_id } => (Some(*user_id), None, None, None),
            CandidateRef::External { name, email, phone } => (
                None,
                Some(name.clone()),
                Some(email.clone()),
                phone.clone(),
            ),
        };

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            INSERT INTO applications
                (id, job_id, candidate_user_id, external_name, external_email, external_phone,
                 status, source, score)
            VALUES ($1, $2, $3, $4, $5, $6, 'applied', $7, NULL)
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(new_app.job_id)
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(new_app.source.as_str())
        .fetch_one(&mut *tx)
        .await?;

        insert_entry(
            &mut tx,
            row.id,
            &NewHistoryEntry {
                actor: None,
                detail: HistoryDetail::Status {
                    status: ApplicationStatus::Applied,
                    notes: None,
                },
            },
        )
        .await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn get(&self, id: Uuid) -> Result<Option<Application>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {} FROM applications WHERE id = $1",
            APPLICATION_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Application::try_from).transpose()
    }

    async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        let rows = match &filter.job_ids {
            Some(job_ids) => {
                sqlx::query_as::<_, ApplicationRow>(&format!(
                    "SELECT {} FROM applications WHERE job_id = ANY($1) ORDER BY created_at",
                    APPLICATION_COLUMNS
                ))
                .bind(job_ids)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ApplicationRow>(&format!(
                    "SELECT {} FROM applications ORDER BY created_at",
                    APPLICATION_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };
        rows.into_iter().map(Application::try_from).collect()
    }

    async fn update_status(
        &self,
        id: Uuid,
        new_status: ApplicationStatus,
        entry: NewHistoryEntry,
    ) -> Result<Application> {
        let mut tx = self.pool.begin().await?;
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            UPDATE applications
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(new_status.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Application not found: {}", id)))?;

        insert_entry(&mut tx, id, &entry).await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn append_entry(&self, id: Uuid, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        let mut tx = self.pool.begin().await?;
        let exists = sqlx::query_scalar::<_, Uuid>("SELECT id FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(Error::NotFound(format!("Application not found: {}", id)));
        }
        let stored = insert_entry(&mut tx, id, &entry).await?;
        tx.commit().await?;
        Ok(stored)
    }

    async fn set_score(&self, id: Uuid, score: i32) -> Result<Application> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            r#"
            UPDATE applications
            SET score = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING {}
            "#,
            APPLICATION_COLUMNS
        ))
        .bind(score)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Application not found: {}", id)))?;
        row.try_into()
    }

    async fn history(&self, id: Uuid) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {} FROM application_history WHERE application_id = $1 ORDER BY seq",
            HISTORY_COLUMNS
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(HistoryEntry::try_from).collect()
    }

    async fn history_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<HistoryEntry>>> {
        let rows = sqlx::query_as::<_, HistoryRow>(&format!(
            "SELECT {} FROM application_history WHERE application_id = ANY($1) ORDER BY seq",
            HISTORY_COLUMNS
        ))
        .bind(ids.to_vec())
        .fetch_all(&self.pool)
        .await?;

        let mut out: HashMap<Uuid, Vec<HistoryEntry>> = HashMap::new();
        for row in rows {
            let entry: HistoryEntry = row.try_into()?;
            out.entry(entry.application_id).or_default().push(entry);
        }
        Ok(out)
    }
}

use crate::error::Result;
use crate::models::job::JobMeta;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

/// Read-only view of the job postings collaborator. The pipeline never
/// writes job data; it only resolves titles, employer scoping, and activity.
#[async_trait]
pub trait JobDirectory: Send + Sync {
    async fn get(&self, id: Uuid) -> Result<Option<JobMeta>>;

    /// All jobs, or the given employer's jobs.
    async fn list(&self, employer_id: Option<Uuid>) -> Result<Vec<JobMeta>>;
}

#[derive(Clone)]
pub struct PgJobDirectory {
    pool: PgPool,
}

impl PgJobDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobDirectory for PgJobDirectory {
    async fn get(&self, id: Uuid) -> Result<Option<JobMeta>> {
        let job = sqlx::query_as::<_, JobMeta>(
            "SELECT id, employer_id, title, status FROM jobs WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(job)
    }

    async fn list(&self, employer_id: Option<Uuid>) -> Result<Vec<JobMeta>> {
        let jobs = match employer_id {
            Some(employer) => {
                sqlx::query_as::<_, JobMeta>(
                    "SELECT id, employer_id, title, status FROM jobs WHERE employer_id = $1 ORDER BY title",
                )
                .bind(employer)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, JobMeta>(
                    "SELECT id, employer_id, title, status FROM jobs ORDER BY title",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(jobs)
    }
}

/// Fixed job directory for tests and local runs without Postgres.
#[derive(Debug, Clone, Default)]
pub struct MemoryJobDirectory {
    jobs: Vec<JobMeta>,
}

impl MemoryJobDirectory {
    pub fn new(jobs: Vec<JobMeta>) -> Self {
        Self { jobs }
    }
}

#[async_trait]
impl JobDirectory for MemoryJobDirectory {
    async fn get(&self, id: Uuid) -> Result<Option<JobMeta>> {
        Ok(self.jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list(&self, employer_id: Option<Uuid>) -> Result<Vec<JobMeta>> {
        Ok(self
            .jobs
            .iter()
            .filter(|j| employer_id.map(|e| j.employer_id == e).unwrap_or(true))
            .cloned()
            .collect())
    }
}

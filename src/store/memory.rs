use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::history::{HistoryDetail, HistoryEntry, NewHistoryEntry};
use crate::store::{ApplicationFilter, ApplicationStore, NewApplication};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Inner {
    applications: HashMap<Uuid, Application>,
    history: HashMap<Uuid, Vec<HistoryEntry>>,
}

/// In-memory store. The map-wide write lock makes every mutating method an
/// atomic unit, which is exactly the per-application guarantee the trait
/// requires. Used by the test suite and for running without Postgres.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Entry timestamps within one log must never decrease, even if the wall
/// clock does.
fn next_timestamp(log: &[HistoryEntry]) -> DateTime<Utc> {
    let now = Utc::now();
    match log.last() {
        Some(last) if last.timestamp > now => last.timestamp,
        _ => now,
    }
}

fn build_entry(application_id: Uuid, entry: NewHistoryEntry, ts: DateTime<Utc>) -> HistoryEntry {
    HistoryEntry {
        id: Uuid::new_v4(),
        application_id,
        actor: entry.actor,
        timestamp: ts,
        detail: entry.detail,
    }
}

#[async_trait]
impl ApplicationStore for MemoryStore {
    async fn create(&self, new_app: NewApplication) -> Result<Application> {
        let mut inner = self.inner.write().await;
        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            job_id: new_app.job_id,
            candidate: new_app.candidate,
            status: ApplicationStatus::Applied,
            source: new_app.source,
            score: None,
            created_at: now,
            updated_at: now,
        };
        let initial = build_entry(
            application.id,
            NewHistoryEntry {
                actor: None,
                detail: HistoryDetail::Status {
                    status: ApplicationStatus::Applied,
                    notes: None,
                },
            },
            now,
        );
        inner.history.insert(application.id, vec![initial]);
        inner.applications.insert(application.id, application.clone());
        Ok(application)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Application>> {
        let inner = self.inner.read().await;
        Ok(inner.applications.get(&id).cloned())
    }

    async fn list(&self, filter: &ApplicationFilter) -> Result<Vec<Application>> {
        let inner = self.inner.read().await;
        let mut apps: Vec<Application> = inner
            .applications
            .values()
            .filter(|a| filter.matches(a.job_id))
            .cloned()
            .collect();
        apps.sort_by_key(|a| a.created_at);
        Ok(apps)
    }

    async fn update_status(
        &self,
        id: Uuid,
        new_status: ApplicationStatus,
        entry: NewHistoryEntry,
    ) -> Result<Application> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        if !inner.applications.contains_key(&id) {
            return Err(Error::NotFound(format!("Application not found: {}", id)));
        }
        let log = inner.history.entry(id).or_default();
        let ts = next_timestamp(log);
        log.push(build_entry(id, entry, ts));
        let app = inner
            .applications
            .get_mut(&id)
            .expect("presence checked above");
        app.status = new_status;
        app.updated_at = ts;
        Ok(app.clone())
    }

    async fn append_entry(&self, id: Uuid, entry: NewHistoryEntry) -> Result<HistoryEntry> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        if !inner.applications.contains_key(&id) {
            return Err(Error::NotFound(format!("Application not found: {}", id)));
        }
        let log = inner.history.entry(id).or_default();
        let ts = next_timestamp(log);
        let stored = build_entry(id, entry, ts);
        log.push(stored.clone());
        Ok(stored)
    }

    async fn set_score(&self, id: Uuid, score: i32) -> Result<Application> {
        let mut inner = self.inner.write().await;
        let app = inner
            .applications
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("Application not found: {}", id)))?;
        app.score = Some(score);
        app.updated_at = Utc::now();
        Ok(app.clone())
    }

    async fn history(&self, id: Uuid) -> Result<Vec<HistoryEntry>> {
        let inner = self.inner.read().await;
        Ok(inner.history.get(&id).cloned().unwrap_or_default())
    }

    async fn history_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<HistoryEntry>>> {
        let inner = self.inner.read().await;
        let mut out = HashMap::new();
        for id in ids {
            if let Some(log) = inner.history.get(id) {
                out.insert(*id, log.clone());
            }
        }
        Ok(out)
    }
}

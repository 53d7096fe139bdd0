use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus};
use crate::models::history::{HistoryDetail, HistoryEntry};
use crate::models::job::JobMeta;
use crate::services::job_service::JobDirectory;
use crate::store::{ApplicationFilter, ApplicationStore};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Optional narrowing of an aggregation to one employer's jobs or one job.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Scope {
    pub employer_id: Option<Uuid>,
    pub job_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageDropOff {
    pub stage: &'static str,
    /// Applications that ever reached this stage, derived from history.
    pub reached: i64,
    /// Share of the previous stage's `reached` that never made it here.
    pub drop_off_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FunnelReport {
    pub applied: i64,
    pub screened: i64,
    pub shortlisted: i64,
    pub interview_scheduled: i64,
    pub interviewed: i64,
    pub hired: i64,
    pub rejected: i64,
    pub stages: Vec<StageDropOff>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceBreakdown {
    pub internal: i64,
    pub external: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobStatsRow {
    pub job_id: Uuid,
    pub title: String,
    pub status: String,
    pub applications: i64,
    pub shortlisted: i64,
    pub interviewed: i64,
    pub hired: i64,
    pub rejected: i64,
    /// Mean of the recorded scores; None when nothing has been scored yet.
    pub avg_score: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub total_jobs: i64,
    pub active_jobs: i64,
    pub total_applications: i64,
    pub hired_count: i64,
    pub rejected_count: i64,
    pub avg_time_to_hire_days: Option<f64>,
    pub avg_ats_score: Option<f64>,
    pub selection_rate: f64,
}

/// Stages reported in the drop-off table, with the minimum pipeline rank an
/// application must have reached to count for the stage. Hired uses the
/// Selected rank so the hired-equivalent statuses collapse into one stage.
const FUNNEL_STAGES: [(&str, u8); 6] = [
    ("applied", 0),
    ("screened", 2),
    ("shortlisted", 3),
    ("interview_scheduled", 4),
    ("interviewed", 5),
    ("hired", 6),
];

/// Read-side aggregation over application records and their logs. Pure
/// reads: safe to run concurrently with transitions, with snapshot accuracy
/// ("eventually accurate", not point-in-time exact).
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn ApplicationStore>,
    jobs: Arc<dyn JobDirectory>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn ApplicationStore>, jobs: Arc<dyn JobDirectory>) -> Self {
        Self { store, jobs }
    }

    /// Translate a scope into a storage filter. An employer scope resolves to
    /// that employer's job ids; an unknown job id is an error rather than an
    /// empty result.
    pub async fn resolve_scope(&self, scope: &Scope) -> Result<(ApplicationFilter, Vec<JobMeta>)> {
        if let Some(job_id) = scope.job_id {
            let job = self
                .jobs
                .get(job_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Job not found: {}", job_id)))?;
            return Ok((ApplicationFilter::for_jobs(vec![job_id]), vec![job]));
        }
        if let Some(employer_id) = scope.employer_id {
            let jobs = self.jobs.list(Some(employer_id)).await?;
            let ids = jobs.iter().map(|j| j.id).collect();
            return Ok((ApplicationFilter::for_jobs(ids), jobs));
        }
        Ok((ApplicationFilter::all(), self.jobs.list(None).await?))
    }

    pub async fn compute_funnel(&self, scope: &Scope) -> Result<FunnelReport> {
        let (filter, _) = self.resolve_scope(scope).await?;
        let apps = self.store.list(&filter).await?;

        let stock = |status: ApplicationStatus| -> i64 {
            apps.iter().filter(|a| a.status == status).count() as i64
        };

        let ids: Vec<Uuid> = apps.iter().map(|a| a.id).collect();
        let logs = self.store.history_for(&ids).await?;
        let max_ranks: Vec<u8> = apps
            .iter()
            .map(|a| max_reached_rank(logs.get(&a.id).map(Vec::as_slice).unwrap_or(&[])))
            .collect();

        let mut stages = Vec::with_capacity(FUNNEL_STAGES.len());
        let mut previous: Option<i64> = None;
        for (stage, threshold) in FUNNEL_STAGES {
            let reached = max_ranks.iter().filter(|&&r| r >= threshold).count() as i64;
            let drop_off_rate = match previous {
                Some(prev) if prev > 0 => (prev - reached) as f64 / prev as f64,
                _ => 0.0,
            };
            stages.push(StageDropOff {
                stage,
                reached,
                drop_off_rate,
            });
            previous = Some(reached);
        }

        Ok(FunnelReport {
            // everyone in scope applied; the rest are current-status stocks
            applied: apps.len() as i64,
            screened: stock(ApplicationStatus::Screened),
            shortlisted: stock(ApplicationStatus::Shortlisted),
            interview_scheduled: stock(ApplicationStatus::InterviewScheduled),
            interviewed: stock(ApplicationStatus::Interviewed),
            hired: apps.iter().filter(|a| a.status.is_hired_equivalent()).count() as i64,
            rejected: stock(ApplicationStatus::Rejected),
            stages,
        })
    }

    pub async fn compute_source_breakdown(&self, scope: &Scope) -> Result<SourceBreakdown> {
        let (filter, _) = self.resolve_scope(scope).await?;
        let apps = self.store.list(&filter).await?;
        let internal = apps
            .iter()
            .filter(|a| a.source == crate::models::application::ApplicationSource::Internal)
            .count() as i64;
        Ok(SourceBreakdown {
            internal,
            external: apps.len() as i64 - internal,
        })
    }

    pub async fn compute_job_stats(&self, scope: &Scope) -> Result<Vec<JobStatsRow>> {
        let (filter, jobs) = self.resolve_scope(scope).await?;
        let apps = self.store.list(&filter).await?;

        let mut by_job: HashMap<Uuid, Vec<&Application>> = HashMap::new();
        for app in &apps {
            by_job.entry(app.job_id).or_default().push(app);
        }

        let mut rows = Vec::with_capacity(jobs.len());
        for job in jobs {
            let job_apps = by_job.remove(&job.id).unwrap_or_default();
            let count = |status: ApplicationStatus| -> i64 {
                job_apps.iter().filter(|a| a.status == status).count() as i64
            };
            let scores: Vec<i32> = job_apps.iter().filter_map(|a| a.score).collect();
            let avg_score = if scores.is_empty() {
                None
            } else {
                Some(scores.iter().sum::<i32>() as f64 / scores.len() as f64)
            };
            rows.push(JobStatsRow {
                job_id: job.id,
                title: job.title,
                status: job.status,
                applications: job_apps.len() as i64,
                shortlisted: count(ApplicationStatus::Shortlisted),
                interviewed: count(ApplicationStatus::Interviewed),
                hired: job_apps
                    .iter()
                    .filter(|a| a.status.is_hired_equivalent())
                    .count() as i64,
                rejected: count(ApplicationStatus::Rejected),
                avg_score,
            });
        }
        Ok(rows)
    }

    pub async fn compute_summary(&self, scope: &Scope) -> Result<PipelineSummary> {
        let (filter, jobs) = self.resolve_scope(scope).await?;
        let apps = self.store.list(&filter).await?;

        let total_applications = apps.len() as i64;
        let hired: Vec<&Application> = apps
            .iter()
            .filter(|a| a.status.is_hired_equivalent())
            .collect();
        let hired_count = hired.len() as i64;
        let rejected_count = apps
            .iter()
            .filter(|a| a.status == ApplicationStatus::Rejected)
            .count() as i64;

        let hired_ids: Vec<Uuid> = hired.iter().map(|a| a.id).collect();
        let logs = self.store.history_for(&hired_ids).await?;
        let mut hire_durations_days = Vec::new();
        for app in &hired {
            if let Some(entry) = logs
                .get(&app.id)
                .and_then(|log| log.iter().find(|e| is_hired_status_entry(e)))
            {
                let days =
                    (entry.timestamp - app.created_at).num_seconds() as f64 / 86_400.0;
                hire_durations_days.push(days);
            }
        }
        let avg_time_to_hire_days = mean(&hire_durations_days);

        let scores: Vec<f64> = apps.iter().filter_map(|a| a.score.map(f64::from)).collect();
        let avg_ats_score = mean(&scores);

        let selection_rate = if total_applications > 0 {
            hired_count as f64 / total_applications as f64
        } else {
            0.0
        };

        Ok(PipelineSummary {
            total_jobs: jobs.len() as i64,
            active_jobs: jobs.iter().filter(|j| j.is_active()).count() as i64,
            total_applications,
            hired_count,
            rejected_count,
            avg_time_to_hire_days,
            avg_ats_score,
            selection_rate,
        })
    }
}

/// Highest pipeline rank this application ever occupied, per its audit log.
/// Derived from history rather than current status so a rejected or stalled
/// application still counts for the stages it passed through.
fn max_reached_rank(log: &[HistoryEntry]) -> u8 {
    log.iter()
        .filter_map(|e| match &e.detail {
            HistoryDetail::Status { status, .. } => status.stage_rank(),
            _ => None,
        })
        .max()
        .unwrap_or(0)
}

fn is_hired_status_entry(entry: &HistoryEntry) -> bool {
    matches!(
        &entry.detail,
        HistoryDetail::Status { status, .. } if status.is_hired_equivalent()
    )
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

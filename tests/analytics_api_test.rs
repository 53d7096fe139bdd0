use std::sync::Arc;

use ats_backend::models::application::{ApplicationSource, ApplicationStatus, CandidateRef};
use ats_backend::models::job::JobMeta;
use ats_backend::services::job_service::MemoryJobDirectory;
use ats_backend::services::pipeline_service::PipelineService;
use ats_backend::services::scoring_service::ScoreProvider;
use ats_backend::store::memory::MemoryStore;
use ats_backend::AppState;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value as JsonValue;
use tower::ServiceExt;
use uuid::Uuid;

struct StubScorer;

#[async_trait::async_trait]
impl ScoreProvider for StubScorer {
    async fn compute_score(
        &self,
        _resume: &str,
        _job_description: &str,
    ) -> ats_backend::error::Result<i32> {
        Ok(50)
    }
}

struct Harness {
    router: Router,
    pipeline: PipelineService,
    job_a: Uuid,
    job_b: Uuid,
    employer_a: Uuid,
}

fn harness() -> Harness {
    let employer_a = Uuid::new_v4();
    let job_a = Uuid::new_v4();
    let job_b = Uuid::new_v4();
    let jobs = vec![
        JobMeta {
            id: job_a,
            employer_id: employer_a,
            title: "Backend Engineer".into(),
            status: "open".into(),
        },
        JobMeta {
            id: job_b,
            employer_id: Uuid::new_v4(),
            title: "Recruiter".into(),
            status: "closed".into(),
        },
    ];
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryJobDirectory::new(jobs)),
        Arc::new(StubScorer),
    );
    let pipeline = state.pipeline_service.clone();
    Harness {
        router: ats_backend::routes::api_router(state, 1000, 1000),
        pipeline,
        job_a,
        job_b,
        employer_a,
    }
}

async fn seed(h: &Harness, job_id: Uuid, status: Option<ApplicationStatus>) -> Uuid {
    let app = h
        .pipeline
        .create_application(
            job_id,
            CandidateRef::External {
                name: "Sam".into(),
                email: "sam@example.com".into(),
                phone: None,
            },
            ApplicationSource::External,
        )
        .await
        .unwrap();
    if let Some(status) = status {
        h.pipeline
            .transition(app.id, status, None, None)
            .await
            .unwrap();
    }
    app.id
}

async fn get(router: &Router, uri: &str) -> (StatusCode, JsonValue) {
    let resp = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn funnel_reports_stock_counts() {
    let h = harness();
    for _ in 0..5 {
        seed(&h, h.job_a, None).await;
    }
    for _ in 0..3 {
        seed(&h, h.job_a, Some(ApplicationStatus::Shortlisted)).await;
    }
    for _ in 0..2 {
        seed(&h, h.job_a, Some(ApplicationStatus::Hired)).await;
    }

    let (status, funnel) = get(&h.router, "/api/analytics/funnel").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(funnel["applied"], 10);
    assert_eq!(funnel["screened"], 0);
    assert_eq!(funnel["shortlisted"], 3);
    assert_eq!(funnel["hired"], 2);
    assert_eq!(funnel["rejected"], 0);

    // drop-off table stays within [0, 1] even with the direct-to-hired jumps
    for stage in funnel["stages"].as_array().unwrap() {
        let rate = stage["drop_off_rate"].as_f64().unwrap();
        assert!((0.0..=1.0).contains(&rate), "bad rate: {}", rate);
    }
}

#[tokio::test]
async fn sources_partition_internal_and_external() {
    let h = harness();
    seed(&h, h.job_a, None).await;
    let internal = h
        .pipeline
        .create_application(
            h.job_a,
            CandidateRef::Internal {
                user_id: Uuid::new_v4(),
            },
            ApplicationSource::Internal,
        )
        .await
        .unwrap();

    let (status, body) = get(&h.router, "/api/analytics/sources").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["internal"], 1);
    assert_eq!(body["external"], 1);
    assert_eq!(internal.status, ApplicationStatus::Applied);
}

#[tokio::test]
async fn job_stats_scope_by_employer_and_job() {
    let h = harness();
    let scored = seed(&h, h.job_a, Some(ApplicationStatus::Interviewed)).await;
    h.pipeline.record_score(scored, 90).await.unwrap();
    seed(&h, h.job_b, Some(ApplicationStatus::Hired)).await;

    let (status, rows) = get(&h.router, "/api/analytics/jobs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rows.as_array().unwrap().len(), 2);

    let (status, rows) = get(
        &h.router,
        &format!("/api/analytics/jobs?employer_id={}", h.employer_a),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Backend Engineer");
    assert_eq!(rows[0]["applications"], 1);
    assert_eq!(rows[0]["interviewed"], 1);
    assert_eq!(rows[0]["avg_score"], 90.0);

    let (status, rows) = get(
        &h.router,
        &format!("/api/analytics/jobs?job_id={}", h.job_b),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["hired"], 1);
    // never scored: null, not zero
    assert!(rows[0]["avg_score"].is_null());

    let (status, _) = get(
        &h.router,
        &format!("/api/analytics/jobs?job_id={}", Uuid::new_v4()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_handles_empty_and_populated_scopes() {
    let h = harness();

    let (status, summary) = get(&h.router, "/api/analytics/summary").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["total_applications"], 0);
    assert_eq!(summary["selection_rate"], 0.0);
    assert!(summary["avg_time_to_hire_days"].is_null());
    assert!(summary["avg_ats_score"].is_null());
    assert_eq!(summary["total_jobs"], 2);
    assert_eq!(summary["active_jobs"], 1);

    seed(&h, h.job_a, Some(ApplicationStatus::Hired)).await;
    seed(&h, h.job_a, Some(ApplicationStatus::Rejected)).await;
    let scored = seed(&h, h.job_a, None).await;
    h.pipeline.record_score(scored, 70).await.unwrap();
    seed(&h, h.job_a, None).await;

    let (_, summary) = get(&h.router, "/api/analytics/summary").await;
    assert_eq!(summary["total_applications"], 4);
    assert_eq!(summary["hired_count"], 1);
    assert_eq!(summary["rejected_count"], 1);
    assert_eq!(summary["selection_rate"], 0.25);
    assert_eq!(summary["avg_ats_score"], 70.0);
    assert!(summary["avg_time_to_hire_days"].as_f64().unwrap() >= 0.0);
}

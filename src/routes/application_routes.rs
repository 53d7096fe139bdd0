use crate::dto::pipeline_dto::{
    AddNotePayload, BulkTransitionPayload, CreateApplicationPayload, MarkViewedPayload,
    ScoreApplicationPayload, SetRatingPayload, TransitionPayload,
};
use crate::error::{Error, Result};
use crate::services::analytics_service::Scope;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

pub async fn create_application(
    State(state): State<AppState>,
    Json(payload): Json<CreateApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let source = payload.effective_source();
    let app = state
        .pipeline_service
        .create_application(payload.job_id, payload.candidate, source)
        .await?;
    Ok((StatusCode::CREATED, Json(app)))
}

pub async fn list_applications(
    State(state): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<impl IntoResponse> {
    let (filter, _) = state.analytics_service.resolve_scope(&scope).await?;
    let apps = state.pipeline_service.list_applications(&filter).await?;
    Ok(Json(apps))
}

/// Pure read; marking an application as viewed is its own operation below.
pub async fn get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let app = state.pipeline_service.get_application(id).await?;
    Ok(Json(app))
}

pub async fn view_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Option<Json<MarkViewedPayload>>,
) -> Result<impl IntoResponse> {
    let actor = payload.map(|Json(p)| p.actor).unwrap_or_default();
    let app = state.pipeline_service.mark_viewed(id, actor).await?;
    Ok(Json(app))
}

pub async fn get_application_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let history = state.pipeline_service.get_history(id).await?;
    Ok(Json(history))
}

pub async fn update_application_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<TransitionPayload>,
) -> Result<impl IntoResponse> {
    let app = state
        .pipeline_service
        .transition(id, payload.status, payload.actor, payload.notes)
        .await?;
    Ok(Json(app))
}

pub async fn bulk_update_status(
    State(state): State<AppState>,
    Json(payload): Json<BulkTransitionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let report = state
        .pipeline_service
        .bulk_transition(
            &payload.application_ids,
            payload.status,
            payload.actor,
            payload.notes,
        )
        .await?;
    Ok(Json(report))
}

pub async fn add_application_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddNotePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let entries = state
        .pipeline_service
        .add_note(id, payload.content, payload.tags, payload.rating, payload.actor)
        .await?;
    Ok((StatusCode::CREATED, Json(entries)))
}

pub async fn set_application_rating(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SetRatingPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let entry = state
        .pipeline_service
        .set_rating(id, payload.rating, payload.actor)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// Ask the scoring collaborator for a fresh match score and persist it.
/// A collaborator failure surfaces as 502 and leaves the record untouched.
pub async fn score_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ScoreApplicationPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let app = state.pipeline_service.get_application(id).await?;

    let job_description = match payload.job_description {
        Some(desc) => desc,
        None => state
            .jobs
            .get(app.job_id)
            .await?
            .map(|j| j.title)
            .ok_or_else(|| Error::NotFound(format!("Job not found: {}", app.job_id)))?,
    };

    let score = state
        .score_provider
        .compute_score(&payload.resume, &job_description)
        .await?;
    let updated = state.pipeline_service.record_score(id, score).await?;
    Ok(Json(updated))
}

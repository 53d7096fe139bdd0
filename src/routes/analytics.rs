use crate::error::Result;
use crate::services::analytics_service::Scope;
use crate::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

pub async fn get_funnel(
    State(state): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<impl IntoResponse> {
    let funnel = state.analytics_service.compute_funnel(&scope).await?;
    Ok(Json(funnel))
}

pub async fn get_source_breakdown(
    State(state): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<impl IntoResponse> {
    let breakdown = state
        .analytics_service
        .compute_source_breakdown(&scope)
        .await?;
    Ok(Json(breakdown))
}

pub async fn get_job_stats(
    State(state): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<impl IntoResponse> {
    let rows = state.analytics_service.compute_job_stats(&scope).await?;
    Ok(Json(rows))
}

pub async fn get_summary(
    State(state): State<AppState>,
    Query(scope): Query<Scope>,
) -> Result<impl IntoResponse> {
    let summary = state.analytics_service.compute_summary(&scope).await?;
    Ok(Json(summary))
}

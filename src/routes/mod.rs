pub mod analytics;
pub mod application_routes;
pub mod health;

use crate::middleware::rate_limit;
use crate::AppState;
use axum::{
    routing::{get, post},
    Router,
};

/// Full API surface. The candidate-facing apply endpoint sits in its own
/// rate-limit bucket; everything else is the employer/integration side.
pub fn api_router(state: AppState, integration_rps: u32, public_rps: u32) -> Router {
    let public_api = Router::new()
        .route(
            "/api/public/applications",
            post(application_routes::create_application),
        )
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(public_rps),
            rate_limit::rps_middleware,
        ));

    let integration_api = Router::new()
        .route(
            "/api/applications",
            get(application_routes::list_applications),
        )
        .route(
            "/api/applications/bulk/status",
            post(application_routes::bulk_update_status),
        )
        .route(
            "/api/applications/:id",
            get(application_routes::get_application),
        )
        .route(
            "/api/applications/:id/view",
            post(application_routes::view_application),
        )
        .route(
            "/api/applications/:id/history",
            get(application_routes::get_application_history),
        )
        .route(
            "/api/applications/:id/status",
            post(application_routes::update_application_status),
        )
        .route(
            "/api/applications/:id/notes",
            post(application_routes::add_application_note),
        )
        .route(
            "/api/applications/:id/rating",
            post(application_routes::set_application_rating),
        )
        .route(
            "/api/applications/:id/score",
            post(application_routes::score_application),
        )
        .route("/api/analytics/funnel", get(analytics::get_funnel))
        .route("/api/analytics/sources", get(analytics::get_source_breakdown))
        .route("/api/analytics/jobs", get(analytics::get_job_stats))
        .route("/api/analytics/summary", get(analytics::get_summary))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit::new_rps_state(integration_rps),
            rate_limit::rps_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .merge(public_api)
        .merge(integration_api)
        .with_state(state)
}

pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

use crate::services::{
    analytics_service::AnalyticsService, job_service::JobDirectory,
    pipeline_service::PipelineService, scoring_service::ScoreProvider,
};
use crate::store::ApplicationStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ApplicationStore>,
    pub jobs: Arc<dyn JobDirectory>,
    pub score_provider: Arc<dyn ScoreProvider>,
    pub pipeline_service: PipelineService,
    pub analytics_service: AnalyticsService,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ApplicationStore>,
        jobs: Arc<dyn JobDirectory>,
        score_provider: Arc<dyn ScoreProvider>,
    ) -> Self {
        let pipeline_service = PipelineService::new(store.clone());
        let analytics_service = AnalyticsService::new(store.clone(), jobs.clone());

        Self {
            store,
            jobs,
            score_provider,
            pipeline_service,
            analytics_service,
        }
    }
}

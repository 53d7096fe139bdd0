pub mod analytics_service;
pub mod job_service;
pub mod pipeline_service;
pub mod scoring_service;

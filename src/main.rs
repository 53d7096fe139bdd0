use ats_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes,
    services::{job_service::PgJobDirectory, scoring_service::HttpScoreProvider},
    store::postgres::PgStore,
    AppState,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store = Arc::new(PgStore::new(pool.clone()));
    let jobs = Arc::new(PgJobDirectory::new(pool));
    let score_provider = Arc::new(HttpScoreProvider::new(
        config.scoring_api_url.clone(),
        config.scoring_api_key.clone(),
    ));
    let app_state = AppState::new(store, jobs, score_provider);

    let app = routes::api_router(app_state, config.integration_rps, config.public_rps)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

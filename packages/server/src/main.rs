use std::sync::Arc;

use anyhow::Context;
use tracing::{Level, info};

use server::config::AppConfig;
use server::services::consistency::run_consistency_monitor;
use server::state::AppState;
use server::store::{ResultStore, SeaOrmStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let level: Level = config
        .log
        .level
        .parse()
        .with_context(|| format!("Invalid log level '{}'", config.log.level))?;
    tracing_subscriber::fmt().with_max_level(level).init();

    let db = server::database::init_db(&config.database.url)
        .await
        .context("Failed to initialize database")?;
    let store: Arc<dyn ResultStore> = Arc::new(SeaOrmStore::new(db));

    tokio::spawn(run_consistency_monitor(
        store.clone(),
        config.judging.consistency_scan_interval_secs,
    ));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = server::build_router(AppState::new(config, store));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

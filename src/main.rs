use anyhow::Context;
use axum::Router;
use dotenvy::dotenv;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use burstlet_api::config::settings::AppConfig;
use burstlet_api::fallback::{FallbackState, fallback_router};
use burstlet_api::infrastructure::db::pool::connect_to_db;
use burstlet_api::infrastructure::redis::client::RedisService;
use burstlet_api::state::AppState;
use burstlet_api::workers::dispatcher::{JobDispatch, recover_stranded_jobs, start_dispatcher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load();
    let port = config.server_port;
    let shutdown = CancellationToken::new();

    let app = if config.supports_full_mode() {
        match build_full_app(config.clone(), shutdown.clone()).await {
            Ok(app) => {
                info!("starting in full mode");
                app
            }
            Err(e) => {
                error!("full startup failed, degrading to fallback mode: {e:#}");
                fallback_router(FallbackState::new(config))
            }
        }
    } else {
        warn!("DATABASE_URL or REDIS_URL missing, starting in fallback mode");
        fallback_router(FallbackState::new(config))
    };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    info!("server listening on http://0.0.0.0:{port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown.clone()))
        .await
        .context("server error")?;

    // Stops the dispatcher and any in-flight remote polls.
    shutdown.cancel();
    info!("server stopped");
    Ok(())
}

async fn build_full_app(
    config: AppConfig,
    shutdown: CancellationToken,
) -> anyhow::Result<Router> {
    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL is not set")?;
    let redis_url = config.redis_url.clone().context("REDIS_URL is not set")?;

    let db = connect_to_db(&database_url)
        .await
        .context("database connection failed")?;
    let redis = RedisService::new(&redis_url)
        .await
        .context("redis connection failed")?;

    let (dispatch_tx, dispatch_rx) = async_channel::unbounded::<JobDispatch>();
    let state = AppState::new(config, db, redis, dispatch_tx);

    // The dispatch channel does not survive restarts; re-dispatch whatever
    // the previous process left unfinished before consuming new work.
    recover_stranded_jobs(&state)
        .await
        .context("job recovery failed")?;

    tokio::spawn(start_dispatcher(state.clone(), dispatch_rx, shutdown));

    Ok(burstlet_api::app::create_app(state).await)
}

async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to listen for ctrl-c: {e}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => error!("failed to listen for SIGTERM: {e}"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received, draining connections");
    shutdown.cancel();
}

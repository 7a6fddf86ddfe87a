use std::{process::ExitCode, sync::Arc};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use food_ordering_api::{
    app::{build_app, serve, shutdown_signal},
    config::AppConfig,
    db::{self, ConnectionState},
    retry::{RetryError, RetryPolicy},
    state::AppState,
    telemetry,
};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    telemetry::init_tracing("food_ordering_api=debug,axum=info,tower_http=info");

    let config = match AppConfig::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let addr = config.socket_addr()?;

    let shutdown = CancellationToken::new();
    let signal_task = {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.cancel();
        })
    };

    let policy = RetryPolicy::from(&config.db);
    let pool = match db::connect_with_retry(&config.database_url, &config.db, &policy, &shutdown).await {
        Ok(pool) => pool,
        Err(RetryError::Cancelled { attempts }) => {
            tracing::info!(attempts, "shutdown requested before the database was reachable");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if let Err(e) = db::run_migrations(&pool).await {
        tracing::warn!(error = %format!("{e:#}"), "migration failed; continuing");
    }

    let (state_tx, state_rx) = watch::channel(ConnectionState::Connected);
    let monitor = db::spawn_monitor(
        pool.clone(),
        config.db.monitor_interval,
        state_tx,
        shutdown.clone(),
    );

    let app = build_app(AppState::new(pool.clone(), config, state_rx));
    let stop = shutdown.clone();
    let served = serve(app, addr, async move { stop.cancelled().await }).await;

    shutdown.cancel();
    signal_task.abort();
    if let Err(e) = monitor.await {
        tracing::warn!(error = %e, "connection monitor ended abnormally");
    }
    pool.close().await;
    tracing::info!("server stopped");
    served
}

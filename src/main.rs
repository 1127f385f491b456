use anyhow::Context;
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::{signal, sync::Notify};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use event_booking::{
    config::{Config, LogMode, DEFAULT_JWT_SECRET},
    controllers,
    database::Database,
    repository::Repositories,
    AppState,
};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("invalid configuration")?;

    init_tracing(config.app.log_mode, &config.app.rust_log);

    info!("Starting event booking API");
    if config.auth.jwt_secret == DEFAULT_JWT_SECRET {
        warn!("JWT_SECRET is not set, tokens are signed with the default secret");
    }

    // Connect to the database
    let db = Database::new(
        &config.database.url,
        config.database.pool_size,
        config.database.acquire_timeout,
    )
    .await
    .context("failed to connect to database")?;
    info!("Database connected");

    db.run_migrations(&config.database.migrations_dir)
        .await
        .context("failed to run migrations")?;

    let addr = config.app.http_addr;
    let grace = config.app.shutdown_grace;
    let state = AppState::new(config, Repositories::postgres(db.pool.clone()));
    let app = controllers::router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    serve_until_shutdown(listener, app, grace).await?;

    db.pool.close().await;
    info!("Server stopped");
    Ok(())
}

fn init_tracing(mode: LogMode, filter: &str) {
    let registry = tracing_subscriber::registry().with(EnvFilter::new(filter));
    match mode {
        LogMode::Prod => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogMode::Dev => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

// Stops accepting on SIGINT/SIGTERM, then drains in-flight requests for at
// most `grace` before giving up on them.
async fn serve_until_shutdown(
    listener: tokio::net::TcpListener,
    app: axum::Router,
    grace: Duration,
) -> anyhow::Result<()> {
    let stop = Arc::new(Notify::new());
    let stop_rx = stop.clone();

    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move { stop_rx.notified().await })
        .into_future();
    let mut server = tokio::spawn(server);

    tokio::select! {
        result = &mut server => {
            return result.context("server task panicked")?.context("server error");
        }
        () = shutdown_signal() => {}
    }

    stop.notify_one();
    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => result.context("server task panicked")?.context("server error"),
        Err(_) => {
            error!("Shutdown grace period of {:?} elapsed, dropping open connections", grace);
            server.abort();
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

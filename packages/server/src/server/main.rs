// Main entry point for the Townbeat discovery server

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use server_core::domains::discovery::scheduler::start_scheduler;
use server_core::domains::discovery::spawn_worker_pool;
use server_core::server::build_app;
use server_core::{ServerConfig, ServerKernel};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Townbeat discovery server");

    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;

    let port = config.port;
    let kernel = ServerKernel::new(pool.clone(), config).context("Failed to build kernel")?;

    // Workers poll the durable job table; shutdown is honored between jobs.
    let shutdown = CancellationToken::new();
    let worker_handles = spawn_worker_pool(kernel.clone(), shutdown.clone());

    let _scheduler = start_scheduler(pool)
        .await
        .context("Failed to start scheduled tasks")?;

    let app = build_app(kernel);
    let addr = format!("0.0.0.0:{port}");
    tracing::info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    let signal_token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
            signal_token.cancel();
        })
        .await
        .context("Server error")?;

    // Let in-flight jobs run to their terminal state.
    for handle in worker_handles {
        let _ = handle.await;
    }

    tracing::info!("Townbeat discovery server stopped");
    Ok(())
}

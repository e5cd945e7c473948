use std::future::Future;
use std::io;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use user_service::infrastructure::config::Settings;
use user_service::infrastructure::{bootstrap, driving};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,user_service=debug")),
        )
        .init();

    let settings = Settings::load().context("loading configuration")?;
    let state = bootstrap(&settings).await.context("starting user service")?;
    let app = driving::router(state, settings.request_timeout());

    let listener = tokio::net::TcpListener::bind(settings.server.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.server.bind_addr))?;
    info!(addr = %settings.server.bind_addr, "user service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

/// Resolves once `signal` fires. A signal that cannot be installed never
/// resolves, so the server keeps running.
async fn wait_for_shutdown(signal: impl Future<Output = io::Result<()>>) {
    match signal.await {
        Ok(()) => info!("shutdown requested"),
        Err(e) => {
            error!(error = %e, "cannot listen for shutdown signal");
            std::future::pending::<()>().await
        }
    }
}

use std::net::SocketAddr;

use anyhow::Context;

use safeaid_api::config::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    safeaid_observability::init();

    let settings = Settings::from_env()?;
    tracing::info!(?settings, "starting safeaid api");

    let app = safeaid_api::app::build_app(&settings).await?;

    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.bind_addr))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

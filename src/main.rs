use anyhow::Context;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pipeline_gate::config::GateConfig;
use pipeline_gate::effects::LoggingExecutor;
use pipeline_gate::layout::Layout;
use pipeline_gate::server::{AppState, build_router};
use pipeline_gate::worker::GateWorker;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pipeline_gate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GateConfig::from_env()?;
    let layout = Layout::load(&config.layout_path)
        .with_context(|| format!("loading layout from {}", config.layout_path.display()))?;

    let (worker, handle) = GateWorker::new(layout, LoggingExecutor::new());
    let shutdown = CancellationToken::new();
    let dispatch = tokio::spawn(worker.run(shutdown.clone()));

    let app = build_router(AppState::new(handle));
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!("listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown({
            let shutdown = shutdown.clone();
            async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => tracing::info!("Shutdown signal received"),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to listen for ctrl-c");
                        std::future::pending::<()>().await;
                    }
                }
                shutdown.cancel();
            }
        })
        .await?;

    shutdown.cancel();
    dispatch.await?;
    Ok(())
}

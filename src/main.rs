mod activity;
mod config;
mod datasets;
mod error;
mod routes;
mod server;
mod settings;
mod state;
mod workbench;

use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use activity::{ActivityLevel, ActivitySource};
use config::{BackendConfig, CliArgs, WorkbenchConfig};
use state::WorkbenchState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    // The guard flushes the log file on exit.
    let (file_layer, _guard) = match &args.log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| std::path::Path::new("."));
            let name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {:?}", path))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evallab_workbench=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    info!("Starting evallab-workbench v{}", env!("CARGO_PKG_VERSION"));

    let config = WorkbenchConfig::from_args(args);
    match &config.backend {
        BackendConfig::Fixture { path, .. } => info!("Serving fixture {:?}", path),
        BackendConfig::Http { base } => info!("Serving evaluation API {}", base),
    }
    info!("Data dir: {:?}", config.data_dir);
    let port = config.port;

    let client = WorkbenchState::http_client()?;
    let source = WorkbenchState::backend(&config, &client);
    let state = Arc::new(WorkbenchState::open(config, source, client).await);

    state
        .activity
        .emit(
            ActivitySource::Workbench,
            ActivityLevel::Info,
            format!("Workbench starting on port {}", port),
        )
        .await;

    let router = server::build_router(state.clone());
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Workbench listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal(state))
        .await?;

    info!("Workbench shutting down");
    Ok(())
}

async fn shutdown_signal(state: Arc<WorkbenchState>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
    state
        .activity
        .emit(
            ActivitySource::Workbench,
            ActivityLevel::Info,
            "Shutdown signal received",
        )
        .await;
}

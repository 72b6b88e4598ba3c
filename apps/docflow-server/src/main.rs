mod config;
mod telemetry;

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use config::AppConfig;
use document_workflow::DocumentWorkflowModule;
use sea_orm::{ConnectOptions, Database};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

/// Docflow document lifecycle server
#[derive(Debug, Parser)]
#[command(name = "docflow-server", version, about)]
struct Cli {
    /// Path to a YAML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::load(cli.config.as_deref())?;

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&cfg)?);
        return Ok(());
    }

    telemetry::init(&cfg.logging)?;
    tracing::info!(bind_addr = %cfg.server.bind_addr, "Starting docflow server");

    tokio::fs::create_dir_all(&cfg.workflow.attachments_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create {}",
                cfg.workflow.attachments_dir.display()
            )
        })?;

    let mut options = ConnectOptions::new(cfg.database.url.clone());
    options
        .max_connections(cfg.database.max_connections)
        .sqlx_logging(false);
    let db = Arc::new(
        Database::connect(options)
            .await
            .context("failed to connect to database")?,
    );

    let module = DocumentWorkflowModule::default();
    module.migrate(&db).await?;
    module.init(cfg.workflow.clone(), db)?;

    let mut app = Router::new().merge(module.router()?);
    if let Some(files) = module.attachments_router() {
        app = app.merge(files);
    }
    let app = app.layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(&cfg.server.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.server.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "Listening");

    let cancel = CancellationToken::new();
    tokio::spawn(wait_for_signal(cancel.clone()));

    let shutdown = cancel.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
    });

    tokio::select! {
        _ = cancel.cancelled() => {}
        joined = &mut server => {
            joined.context("server task panicked")?.context("server exited")?;
            tracing::warn!("Server exited before shutdown was requested");
            return Ok(());
        }
    }
    let grace = Duration::from_secs(cfg.server.shutdown_timeout_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined??,
        Err(_) => tracing::warn!("In-flight requests did not finish within {:?}", grace),
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn wait_for_signal(cancel: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown requested");
    cancel.cancel();
}

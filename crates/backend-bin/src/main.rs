use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use social_backend::{
    config::{Settings, StorageBackend},
    create_router,
    logging::init_logging,
    AppState, LIMITER_SWEEP_INTERVAL,
};
use tokio::net::TcpListener;

/// Social network REST backend
#[derive(Debug, Parser)]
#[command(name = "social-server", version, about)]
struct Cli {
    /// Path to a TOML settings file (defaults to ./social.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to bind
    #[arg(long)]
    port: Option<u16>,

    /// Directory holding the flat-file database
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Keep all data in memory; nothing is written to disk
    #[arg(long)]
    ephemeral: bool,
}

impl Cli {
    fn apply(self, settings: &mut Settings) {
        if let Some(host) = self.host {
            settings.server.host = host;
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
        if let Some(dir) = self.data_dir {
            settings.storage.path = dir;
        }
        if self.ephemeral {
            settings.storage.backend = StorageBackend::Memory;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    cli.apply(&mut settings);
    settings.validate()?;

    init_logging(&settings.log)?;

    let addr = settings.server.bind_addr()?;
    let state = Arc::new(AppState::open(settings).await?);
    let store = state.store.clone();
    state.spawn_limiter_cleanup(LIMITER_SWEEP_INTERVAL);

    let app = create_router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.close().await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}

use clap::Parser;
use linkit::{Config, Registry, db, net::http, services::LogMailer};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

#[derive(Debug, Parser)]
#[command(name = "linkit", about = "linkit username and auth server")]
struct Args {
    /// TOML config file; environment variables are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep everything in memory instead of PostgreSQL
    #[arg(long)]
    memory: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let args = Args::parse();
    let cfg = Arc::new(match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    });

    let mailer = Arc::new(LogMailer);
    let registry = if args.memory {
        tracing::warn!("running with in-memory storage; nothing is persisted");
        Arc::new(Registry::in_memory(cfg.clone(), mailer))
    } else {
        let db = Arc::new(db::Db::new(&cfg.database_url, cfg.db_pool_size)?);
        db.init().await?;
        Arc::new(Registry::new(db, cfg.clone(), mailer))
    };

    spawn_background_tasks(registry.clone());

    let addr: SocketAddr = cfg.http_addr.parse()?;
    http::serve(addr, registry).await?;

    Ok(())
}

fn spawn_background_tasks(registry: Arc<Registry>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match registry.services.auth.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(n) => tracing::info!(purged = n, "expired sessions removed"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    });
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().map_err(|e| anyhow::anyhow!(e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,linkit=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::uptime()),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();

    Ok(())
}

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use linkit::db::Db;
use linkit::error::DomainError;
use linkit::services::LogMailer;
use linkit::{Config, Registry};
use linkit_core::{
    AvailabilityClient, CheckPhase, HttpAvailabilityClient, MockAvailabilityClient, UsernameCheck, UsernameCheckState,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

// cargo run -p linkit-admin -- reserve support --reason "staff"
// printf 'ad\nada\nadalove\n' | cargo run -p linkit-admin -- watch --mock

#[derive(Debug, Parser)]
#[command(name = "linkit-admin", version, about = "Maintenance tasks for a linkit installation")]
struct Args {
    /// TOML config file; environment variables are used when absent
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override database URL (if omitted, use env/config)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(flatten)]
    Db(DbCommand),
    /// Feed stdin lines into a live availability check and print each state change
    Watch(WatchArgs),
}

#[derive(Debug, Subcommand)]
enum DbCommand {
    /// Apply pending database migrations
    Migrate,
    /// Reserve a username so nobody can claim it
    Reserve {
        name: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Release a reserved username
    Unreserve { name: String },
    /// List reserved usernames
    Reserved,
    /// Check whether a username can be claimed
    Check { name: String },
}

#[derive(Debug, ClapArgs)]
struct WatchArgs {
    /// Server to query
    #[arg(long, default_value = "http://localhost:4001")]
    url: String,
    #[arg(long, default_value_t = 500)]
    debounce_ms: u64,
    /// Use the built-in mock instead of a server
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let args = Args::parse();

    match args.command {
        Command::Watch(w) => watch(&w).await,
        Command::Db(cmd) => {
            let registry = open_registry(args.config, args.database_url).await?;
            run(cmd, &registry).await
        }
    }
}

async fn open_registry(config: Option<PathBuf>, database_url: Option<String>) -> anyhow::Result<Registry> {
    let mut cfg = match config {
        Some(path) => Config::load(path)?,
        None => Config::from_env()?,
    };
    if let Some(url) = database_url {
        cfg.database_url = url;
    }

    let db = Arc::new(Db::new(&cfg.database_url, 2).context("cannot create database pool")?);
    db.init().await.context("cannot migrate database")?;

    Ok(Registry::new(db, Arc::new(cfg), Arc::new(LogMailer)))
}

async fn run(cmd: DbCommand, registry: &Registry) -> anyhow::Result<()> {
    let usernames = &registry.services.username;

    match cmd {
        DbCommand::Migrate => println!("database is up to date"),
        DbCommand::Reserve { name, reason } => {
            if usernames.reserve(&name, reason.as_deref()).await? {
                println!("reserved {name}");
            } else {
                println!("{name} was already reserved");
            }
        }
        DbCommand::Unreserve { name } => {
            if usernames.unreserve(&name).await? {
                println!("released {name}");
            } else {
                println!("{name} was not reserved");
            }
        }
        DbCommand::Reserved => {
            for r in usernames.reserved().await? {
                println!("{:<24} {}", r.username, r.reason.as_deref().unwrap_or("-"));
            }
        }
        DbCommand::Check { name } => match usernames.is_available(&name).await {
            Ok(true) => println!("{name}: available"),
            Ok(false) => println!("{name}: taken"),
            Err(DomainError::Validation { message, .. }) => println!("{name}: {message}"),
            Err(e) => return Err(e.into()),
        },
    }

    Ok(())
}

async fn watch(args: &WatchArgs) -> anyhow::Result<()> {
    let client: Arc<dyn AvailabilityClient> = if args.mock {
        Arc::new(MockAvailabilityClient::default())
    } else {
        let client = HttpAvailabilityClient::new(&args.url).map_err(|e| anyhow::anyhow!("{}: {e}", args.url))?;
        Arc::new(client)
    };

    let check = UsernameCheck::with_debounce(client, Duration::from_millis(args.debounce_ms));
    let mut rx = check.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => check.on_change(line),
                None => stdin_open = false,
            },
            changed = rx.changed() => {
                if changed.is_err() {
                    break;
                }
                print_state(&rx.borrow_and_update());
            }
        }

        // Once input ends, wait for the last value to settle
        if !stdin_open && !matches!(check.state().phase, CheckPhase::Debouncing | CheckPhase::Checking) {
            break;
        }
    }

    if rx.has_changed().unwrap_or(false) {
        print_state(&rx.borrow_and_update());
    }
    Ok(())
}

fn print_state(st: &UsernameCheckState) {
    let available = match st.is_available {
        Some(true) => "yes",
        Some(false) => "no",
        None => "?",
    };
    println!(
        "{:<12} {:<32} checking={:<5} available={:<3} {}",
        format!("{:?}", st.phase),
        format!("{:?}", st.value),
        st.is_checking,
        available,
        st.error.as_deref().unwrap_or(""),
    );
}

fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, prelude::*};

    color_eyre::install().map_err(|e| anyhow::anyhow!(e))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(tracing_error::ErrorLayer::default())
        .init();

    Ok(())
}

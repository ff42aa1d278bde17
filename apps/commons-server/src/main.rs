use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use runtime::{absolutize_sqlite_dsn, detect_backend, AppConfig, CliArgs, DatabaseConfig};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use api_ingress::{ApiIngress, ApiIngressConfig};
use events::config::EventsConfig;
use events::Events;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const MEMORY_DSN: &str = "sqlite::memory:";

/// The Commons Server - community events backend
#[derive(Parser)]
#[command(name = "commons-server")]
#[command(about = "The Commons Server - community events backend")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use an in-memory SQLite database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.as_ref().cloned().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Commons Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, args),
    }
}

/// Final DSN for the process: `--mock` wins, relative sqlite paths land under home_dir.
fn resolve_dsn(db_config: Option<&DatabaseConfig>, args: &CliArgs, home_dir: &Path) -> Result<String> {
    if args.mock {
        return Ok(MEMORY_DSN.to_string());
    }
    let db_config = db_config.context("Database URL not configured")?;
    detect_backend(&db_config.url)?;
    absolutize_sqlite_dsn(db_config.url.trim(), home_dir, true)
}

/// Ingress config with the server section filling in what the module section leaves out.
fn ingress_config(config: &AppConfig, args: &CliArgs) -> Result<ApiIngressConfig> {
    let mut ingress: ApiIngressConfig = config.module_config(ApiIngress::NAME)?;

    let explicit_bind = config
        .modules
        .get(ApiIngress::NAME)
        .and_then(|m| m.get("bind_addr"))
        .is_some();
    if !explicit_bind || args.port.is_some() {
        ingress.bind_addr = format!("{}:{}", config.server.host, config.server.port);
    }

    let explicit_timeout = config
        .modules
        .get(ApiIngress::NAME)
        .and_then(|m| m.get("request_timeout_sec"))
        .is_some();
    if !explicit_timeout && config.server.timeout_sec > 0 {
        ingress.request_timeout_sec = config.server.timeout_sec;
    }
    Ok(ingress)
}

async fn connect_database(
    dsn: &str,
    db_config: Option<&DatabaseConfig>,
) -> Result<DatabaseConnection> {
    let mut opts = ConnectOptions::new(dsn.to_owned());
    opts.acquire_timeout(Duration::from_secs(5)).sqlx_logging(false);

    if dsn == MEMORY_DSN {
        // Every new connection to sqlite::memory: is a separate database
        opts.max_connections(1).min_connections(1);
    } else {
        opts.max_connections(db_config.and_then(|c| c.max_conns).unwrap_or(10));
    }

    if detect_backend(dsn)? == "sqlite" {
        let busy = Duration::from_millis(u64::from(
            db_config.and_then(|c| c.busy_timeout_ms).unwrap_or(5000),
        ));
        opts.map_sqlx_sqlite_opts(move |o| o.busy_timeout(busy));
    }

    tracing::info!("Connecting to database: {}", dsn);
    let db = Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to database '{dsn}'"))?;
    tracing::info!("Connected DB backend: {:?}", db.get_database_backend());
    Ok(db)
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let home_dir = PathBuf::from(&config.server.home_dir);
    let ingress_cfg = ingress_config(&config, &args)?;
    let events_cfg: EventsConfig = config.module_config(Events::NAME)?;

    let dsn = resolve_dsn(config.database.as_ref(), &args, &home_dir)?;
    let db = connect_database(&dsn, config.database.as_ref()).await?;
    Events::migrate(&db).await?;

    let events = Events::default();
    events.init(db, events_cfg)?;

    let ingress = ApiIngress::new(ingress_cfg);
    let router = ingress.build_router(
        events.register_rest(axum::Router::new())?,
        Some(Events::openapi()),
    )?;
    let listener = ingress.bind().await?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            wait_for_shutdown_signal().await;
            cancel.cancel();
        }
    });

    ingress.serve(listener, router, cancel).await?;
    tracing::info!("Commons Server stopped");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}

fn check_config(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    let ingress = ingress_config(&config, &args)?;
    ingress
        .bind_addr
        .parse::<std::net::SocketAddr>()
        .with_context(|| format!("Invalid bind address '{}'", ingress.bind_addr))?;
    let events_cfg: EventsConfig = config.module_config(Events::NAME)?;
    events_cfg.checked_default_price()?;
    if !args.mock {
        let db = config.database.as_ref().context("Database URL not configured")?;
        detect_backend(&db.url)?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}

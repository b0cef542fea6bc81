#![forbid(unsafe_code)]

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use rentals_api::{AppState, router};
use rentals_core::config::{RentalsConfig, load_config, resolve_bind};
use serde_json::json;
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "rentals: property registry with an audited change history",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Read configuration from this file instead of the search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Run the HTTP API",
        long_about = "Run the HTTP API over fresh in-memory stores.",
        after_help = "EXAMPLES:\n    # Listen on the configured address\n    rentals serve\n\n    # Override the bind address\n    rentals serve --bind 0.0.0.0:8080"
    )]
    Serve(ServeArgs),

    #[command(
        about = "Print the effective configuration",
        after_help = "EXAMPLES:\n    # Show the merged config as TOML\n    rentals config\n\n    # Machine-readable output\n    rentals config --json"
    )]
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on. Wins over `RENTALS_BIND` and the config file.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Emit JSON instead of TOML.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let cwd = env::current_dir().context("failed to read the working directory")?;
    let (config, source) = load_config(cli.config.as_deref(), &cwd)?;

    match cli.command {
        Commands::Serve(args) => serve(&config, args).await,
        Commands::Config(args) => print_config(&config, source.as_deref(), args.json),
    }
}

async fn serve(config: &RentalsConfig, args: ServeArgs) -> anyhow::Result<()> {
    let bind = resolve_bind(config, env::var("RENTALS_BIND").ok(), args.bind);
    let app = router(AppState::in_memory(config));

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(%bind, "rentals API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("rentals API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
    }
}

fn print_config(config: &RentalsConfig, source: Option<&Path>, json: bool) -> anyhow::Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        let value = json!({
            "source": source,
            "config": config,
        });
        serde_json::to_writer_pretty(&mut out, &value)?;
        writeln!(out)?;
    } else {
        let origin = source.map_or_else(
            || "built-in defaults".to_string(),
            |path| path.display().to_string(),
        );
        writeln!(out, "# source: {origin}")?;
        write!(out, "{}", toml::to_string_pretty(config)?)?;
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("RENTALS_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "rentals=debug,rentals_core=debug,rentals_api=debug,tower_http=debug,info"
        } else {
            "rentals=info,rentals_core=info,rentals_api=info,warn"
        })
    });

    let format = env::var("RENTALS_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    if format == "json" {
        registry.with(fmt::layer().json().with_ansi(false)).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

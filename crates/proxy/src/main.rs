//! Webstore Mirror - Main entry point
//!
//! A rewriting reverse mirror for an extension store.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use mirror_config::validate::{lint::lint_config, network::validate_upstreams};
use mirror_config::MirrorConfig;
use mirror_proxy::{serve, AppState};

/// Webstore Mirror - a rewriting reverse mirror for an extension store
#[derive(Parser, Debug)]
#[command(name = "webstore-mirror")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long = "config", env = "MIRROR_CONFIG")]
    config: Option<String>,

    /// Test configuration and exit
    #[arg(short = 't', long = "test")]
    test: bool,

    /// Enable verbose logging (debug level)
    #[arg(long = "verbose")]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long = "json-logs")]
    json_logs: bool,

    /// Override the listen address from the configuration
    #[arg(long = "listen")]
    listen: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate configuration file and exit
    Test {
        /// Configuration file to test
        #[arg(short = 'c', long = "config")]
        config: Option<String>,

        /// Also check that the upstream store and catalog host are reachable
        #[arg(long = "network")]
        network: bool,
    },
    /// Run the mirror (default)
    Run {
        /// Configuration file path
        #[arg(short = 'c', long = "config")]
        config: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.json_logs);

    if cli.test {
        return test_config(cli.config.as_deref(), false);
    }

    match cli.command {
        Some(Commands::Test { config, network }) => {
            test_config(config.as_deref().or(cli.config.as_deref()), network)
        }
        Some(Commands::Run { config }) => run_server(config.or(cli.config), cli.listen),
        None => run_server(cli.config, cli.listen),
    }
}

fn init_logging(verbose: bool, json: bool) {
    let log_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(config_path: Option<&str>) -> Result<MirrorConfig> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            MirrorConfig::from_file(path).context("Failed to load configuration file")
        }
        None => {
            info!("No configuration specified, using embedded default configuration");
            MirrorConfig::default_embedded().context("Failed to load embedded configuration")
        }
    }
}

/// Test configuration file and exit
fn test_config(config_path: Option<&str>, network: bool) -> Result<()> {
    let config = load_config(config_path)?;
    config.validate().context("Configuration validation failed")?;

    for warning in lint_config(&config).warnings {
        warn!("{}", warning.message);
    }

    if network {
        let runtime = tokio::runtime::Runtime::new()?;
        let result = runtime.block_on(validate_upstreams(&config));
        for warning in &result.warnings {
            warn!("{}", warning.message);
        }
        if !result.is_valid() {
            for e in &result.errors {
                error!("{}", e);
            }
            anyhow::bail!("Network validation failed");
        }
    }

    info!("Configuration test successful:");
    info!("  - listen: {}", config.listen);
    info!("  - upstream: {}", config.upstream_origin());
    info!("  - catalog: {} (ttl {}s)", config.catalog_url, config.catalog_ttl_secs);

    println!(
        "webstore-mirror: configuration file {} test is successful",
        config_path.unwrap_or("(embedded)")
    );

    Ok(())
}

/// Run the mirror
fn run_server(config_path: Option<String>, listen: Option<String>) -> Result<()> {
    let mut config = load_config(config_path.as_deref())?;
    if let Some(listen) = listen {
        config.listen = listen;
    }
    config.validate().context("Configuration validation failed")?;

    for warning in lint_config(&config).warnings {
        warn!("{}", warning.message);
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build Tokio runtime")?;

    runtime.block_on(async move {
        let listen = config.listen.clone();
        let state = Arc::new(AppState::new(config).context("Failed to initialize mirror")?);

        // Warm the catalog so the first search does not pay for the fetch
        let warm_state = Arc::clone(&state);
        tokio::spawn(async move {
            let snapshot = warm_state.catalog.get_items().await;
            info!(items = snapshot.len(), "Catalog prefetch finished");
        });

        let listener = TcpListener::bind(&listen)
            .await
            .with_context(|| format!("Failed to bind {}", listen))?;

        serve(state, listener, shutdown_signal())
            .await
            .context("Server error")
    })
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
        info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, initiating graceful shutdown");
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

mod config;
mod error;
mod fetch;
mod render;
mod route;

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use tracing::info;

use engine::{Catalog, LogDocument};

use crate::config::{LogFormat, PortalConfig};
use crate::fetch::{fetch_url, Fetcher};
use crate::route::AppState;

/// Diagnose OBS Studio log files, from a paste-service URL, a local file,
/// or as an HTTP service.
#[derive(Debug, Parser)]
#[command(name = "obs-log-portal", version)]
struct Args {
    /// URL of a gist, hastebin, obsproject, pastebin or Discord log
    #[arg(short, long, conflicts_with = "file")]
    url: Option<String>,

    /// Local log file to analyze
    #[arg(short, long)]
    file: Option<std::path::PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Include finding details in JSON output
    #[arg(long)]
    detailed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Phase 1: basic tracing so config loading can log. Thread-local so
    // the phase-2 global subscriber can take over.
    let basic_tracing = init_tracing_basic();

    let args = Args::parse();
    let config = PortalConfig::load().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    drop(basic_tracing);
    init_tracing_from_config(&config);

    if args.url.is_some() || args.file.is_some() {
        return analyze_once(args, &config).await;
    }
    serve(&config).await
}

/// One-shot CLI analysis of a single log.
async fn analyze_once(args: Args, config: &PortalConfig) -> Result<()> {
    let text = if let Some(path) = &args.file {
        fetch::read_file(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?
    } else if let Some(url) = &args.url {
        let fetcher = Fetcher::new(&config.fetch).context("Failed to build HTTP client")?;
        fetch_url(&fetcher, url).await.context("Failed to fetch log")?
    } else {
        unreachable!("caller checked url/file presence");
    };

    let catalog = Catalog::default();
    let report = tokio::task::spawn_blocking(move || {
        let doc = LogDocument::from_text(&text);
        engine::run(&doc, &catalog)
    })
    .await
    .context("Analysis task failed")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&render::to_json(&report, args.detailed))?
        );
    } else {
        println!("{}", render::summary_text(&report));
        println!("{}", render::details_text(&report));
    }
    Ok(())
}

/// Run the HTTP analysis service until interrupted.
async fn serve(config: &PortalConfig) -> Result<()> {
    let fetcher = Fetcher::new(&config.fetch).context("Failed to build HTTP client")?;
    let state = AppState::new(config.clone(), fetcher);
    let app = route::build_router(state);

    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .context("Invalid bind address")?;
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    info!("Listening on: http://{}", addr);
    info!("  - Analysis endpoint: http://{}/?url=<log url>", addr);
    info!("  - Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
    }
}

fn init_tracing_basic() -> tracing::subscriber::DefaultGuard {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,portal=debug"));

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_default(subscriber)
}

fn init_tracing_from_config(config: &PortalConfig) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            let layer = fmt::layer().json().with_target(true);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
        LogFormat::Pretty => {
            let layer = fmt::layer()
                .with_target(true)
                .with_file(false)
                .with_line_number(false);
            tracing_subscriber::registry().with(filter).with(layer).init();
        }
    }
}

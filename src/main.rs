mod cli;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

// mimalloc releases memory back to the OS under the worker-pool's high churn
// allocation pattern, where glibc malloc tends to hold onto it.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use webcrawl_core::AppConfig;

use crate::cli::Cli;

fn main() -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config_str = std::fs::read_to_string(&cli.config).unwrap_or_else(|_| {
        warn!(path = %cli.config, "config file not found, using built-in defaults");
        include_str!("../config/default.toml").to_string()
    });
    let mut config: AppConfig = toml::from_str(&config_str)?;

    // Environment variable overrides, applied before the CLI flags below so a
    // flag always wins over an env var, mirroring the teacher's
    // SCALE_LEVEL/TOR_WORKERS-style layering.
    if let Ok(v) = std::env::var("WEBCRAWL_HOST") {
        config.server.host = v;
    }
    if let Ok(v) = std::env::var("WEBCRAWL_PORT") {
        match v.parse::<u16>() {
            Ok(port) => config.server.port = port,
            Err(_) => warn!(value = %v, "ignoring invalid WEBCRAWL_PORT"),
        }
    }
    if let Ok(v) = std::env::var("WEBCRAWL_MAX_WORKERS") {
        match v.parse::<usize>() {
            Ok(n) if n > 0 => config.scan_defaults.max_workers = n,
            _ => warn!(value = %v, "ignoring invalid WEBCRAWL_MAX_WORKERS"),
        }
    }

    // Individual CLI flags can override the env vars above.
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = webcrawl_server::AppState::new(config);
    let router = webcrawl_server::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}

use anyhow::{Context, Result, bail};
use ollama_relay::{
    config::{self, LogsConfig},
    server,
};
use tracing::info;
use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Picks the log filter: `RUST_LOG` wins over `server.logs.level`.
fn log_filter(rust_log: Option<String>, logs: &LogsConfig) -> Result<String> {
    let level = rust_log.unwrap_or_else(|| logs.level.clone());

    if level.parse::<LevelFilter>().is_err() {
        bail!(
            "Invalid log level: '{}'. Valid levels: error, warn, info, debug, trace",
            level
        );
    }
    Ok(level)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging is configured from the file, so nothing can be traced before this.
    let config = config::load()
        .await
        .context("Failed to load configuration")?;
    let filter = log_filter(std::env::var("RUST_LOG").ok(), &config.server.logs)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&filter))
        .json()
        .init();

    info!(
        "Ollama relay for {} starting on {}:{} (log level {})",
        config.relay.model, config.server.host, config.server.port, filter
    );

    server::run(config).await?;

    Ok(())
}

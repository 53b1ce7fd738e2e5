//! Manzai script service binary.

use clap::Parser;
use manzai_server::{ManzaiConfig, build_app, init_logging, serve};
use std::path::PathBuf;

/// Serve the manzai script generator over HTTP.
#[derive(Parser, Debug)]
#[command(name = "manzai", about = "Japanese manzai script generation service", version)]
struct Cli {
    /// Configuration file, replacing ./manzai.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address (overrides server.bind)
    #[arg(short, long)]
    bind: Option<String>,

    /// Emit JSON log lines
    #[arg(long)]
    json_logs: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let mut config = ManzaiConfig::load(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind = bind;
        config.validate()?;
    }
    if cli.json_logs {
        config.server.json_logs = true;
    }
    if cli.verbose {
        config.server.log_level = "debug".to_string();
    }

    init_logging(&config.server)?;

    let app = build_app(&config)?;
    serve(app, &config).await?;
    Ok(())
}

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use toolwire_server::{api, AppState, ServerConfig};

#[derive(Parser, Debug)]
#[command(name = "toolwire-sse")]
#[command(about = "MCP demo server over HTTP and Server-Sent Events", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "toolwire.toml")]
    config: PathBuf,

    /// Port to listen on
    #[arg(short, long, default_value = "3001")]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolwire_server=info,toolwire_mcp=info,tower_http=debug".into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let args = Args::parse();

    // Load configuration
    let config = ServerConfig::load(&args.config)?;
    tracing::info!(
        "Starting {} v{}",
        config.server.name,
        config.server.version
    );

    let state = AppState::new(config)?;

    let addr = format!("{}:{}", args.host, args.port);
    tracing::info!(
        "Connect to {}{}",
        addr,
        state.config.paths.sse
    );

    api::serve(&addr, state).await?;

    Ok(())
}

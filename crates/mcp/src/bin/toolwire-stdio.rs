// Standalone MCP server over stdin/stdout

use anyhow::Result;
use clap::Parser;
use toolwire_mcp::server::demo_server;
use toolwire_mcp::stdio::serve_stdio;

#[derive(Parser, Debug)]
#[command(name = "toolwire-stdio")]
#[command(about = "MCP demo server speaking JSON-RPC over stdio", long_about = None)]
struct Args {
    /// Server name reported during initialization
    #[arg(long, default_value = "stdio-server")]
    name: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries protocol frames, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolwire_mcp=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();
    let pid = std::process::id();

    let result = run(&args, pid).await;
    if let Err(ref e) = result {
        tracing::error!("Fatal error running server (PID: {}): {:#}", pid, e);
    }
    result
}

async fn run(args: &Args, pid: u32) -> Result<()> {
    let server = demo_server(&args.name, env!("CARGO_PKG_VERSION"), "")?;
    tracing::info!("Server started (PID: {})", pid);
    serve_stdio(server).await
}

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use toolwire_sdk::protocol::Implementation;
use toolwire_sdk::{ClientSession, StdioTransport};

#[derive(Parser, Debug)]
#[command(name = "stdio-client")]
#[command(about = "Spawn an MCP server over stdio and exercise its demo tool and resource", long_about = None)]
struct Args {
    /// Server executable
    #[arg(long, default_value = "toolwire-stdio")]
    command: String,

    /// Argument passed to the server (repeatable)
    #[arg(long = "arg")]
    args: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout belongs to the demo output, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolwire_sdk=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    let transport = StdioTransport::new(&args.command, &args.args);
    let session = ClientSession::connect(transport, Implementation::new("stdio-client", "1.0.0"))
        .await
        .with_context(|| format!("Failed to start {}", args.command))?;

    println!("Testing add tool:");
    let sum = session.call_tool("add", json!({"a": 4, "b": 4})).await?;
    println!("4 + 4 = {}", serde_json::to_string(&sum)?);

    println!("\nTesting greeting resource:");
    let greeting = session.read_resource("greeting://Lucy").await?;
    println!("Greeting: {}", serde_json::to_string(&greeting)?);

    session.close().await?;
    Ok(())
}

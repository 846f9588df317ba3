use anyhow::{Context, Result};
use clap::Parser;
use toolwire_sdk::config::load_dotenv;
use toolwire_sdk::{AgentConfig, AgentContext, IntentRouter};

const DEFAULT_PROMPTS: [&str; 2] = ["请帮我计算 3 加 5 等于多少", "请给 Alice 一个友好的问候"];

#[derive(Parser, Debug)]
#[command(name = "intent-router")]
#[command(about = "Classify free text into MCP operations and run them", long_about = None)]
struct Args {
    /// Inputs to run instead of the built-in demo inputs
    prompts: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolwire_sdk=info".into()),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    load_dotenv();
    let config = AgentConfig::from_env()?;

    let ctx = AgentContext::connect(&config, "intent-router")
        .await
        .context("Failed to connect to MCP server")?;
    ctx.log_resource_templates().await;

    let router = IntentRouter::default();
    let prompts = if args.prompts.is_empty() {
        DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect()
    } else {
        args.prompts
    };

    for prompt in &prompts {
        println!("\n-------------------------------");
        println!("Processing input: {}", prompt);
        println!("Reply: {}", router.process(&ctx, prompt).await);
        println!("-------------------------------\n");
    }

    ctx.shutdown().await?;
    tracing::info!("Demo finished, session closed");
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use toolwire_sdk::config::load_dotenv;
use toolwire_sdk::{bridge, AgentConfig, AgentContext};

const DEFAULT_PROMPTS: [&str; 2] = ["用中文回答：4和4的和是多少?", "用中文回答：给Lucy一个问候"];

#[derive(Parser, Debug)]
#[command(name = "function-calling")]
#[command(about = "Let a chat model call MCP tools through function calling", long_about = None)]
struct Args {
    /// Prompts to run instead of the built-in demo prompts
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

    let ctx = AgentContext::connect(&config, "function-calling")
        .await
        .context("Failed to connect to MCP server")?;
    ctx.log_resource_templates().await;

    let prompts = if args.prompts.is_empty() {
        DEFAULT_PROMPTS.iter().map(|p| p.to_string()).collect()
    } else {
        args.prompts
    };

    for prompt in &prompts {
        println!("\n-------------------------------");
        println!("Processing prompt: {}", prompt);
        match bridge::run_exchange(&ctx, prompt).await {
            Ok(answer) => println!("Response: {}", answer),
            Err(e) => tracing::error!("Error processing prompt {:?}: {}", prompt, e),
        }
        println!("-------------------------------\n");
    }

    ctx.shutdown().await?;
    Ok(())
}

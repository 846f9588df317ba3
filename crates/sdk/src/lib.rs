//! # Toolwire SDK
//!
//! Client side of the MCP tool/resource protocol, plus two agents that
//! put a chat-completion model in front of it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use toolwire_sdk::{ClientSession, SdkResult, SseTransport};
//! use toolwire_sdk::protocol::Implementation;
//!
//! #[tokio::main]
//! async fn main() -> SdkResult<()> {
//!     let transport = SseTransport::new("http://localhost:3001/sse".parse()?);
//!     let session = ClientSession::connect(transport, Implementation::new("demo", "1.0.0")).await?;
//!
//!     let sum = session.call_tool("sse-add", serde_json::json!({"a": 4, "b": 4})).await?;
//!     println!("4 + 4 = {}", sum.first_text().unwrap_or_default());
//!
//!     let greeting = session.read_resource("sse-greeting://Lucy").await?;
//!     println!("{}", greeting.first_text().unwrap_or_default());
//!
//!     session.close().await
//! }
//! ```
//!
//! ## Function calling
//!
//! ```rust,no_run
//! use toolwire_sdk::{bridge, AgentConfig, AgentContext};
//!
//! # async fn example() -> toolwire_sdk::SdkResult<()> {
//! let config = AgentConfig::from_env()?;
//! let ctx = AgentContext::connect(&config, "function-calling").await?;
//! let answer = bridge::run_exchange(&ctx, "what is 4 + 4").await?;
//! println!("{}", answer);
//! # Ok(())
//! # }
//! ```

pub mod bridge;
pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod intent;
pub mod llm;
pub mod transport;

pub use client::ClientSession;
pub use config::AgentConfig;
pub use context::AgentContext;
pub use error::{SdkError, SdkResult};
pub use intent::{IntentRouter, Operation, OperationRegistry};
pub use transport::{SseTransport, StdioTransport, Transport};

// Re-export core types for convenience
pub use toolwire_core::protocol;
pub use toolwire_core::{CallToolResult, OperationResult, ReadResourceResult, ToolContent};

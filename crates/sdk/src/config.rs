//! Configuration types for the agent binaries.

use crate::error::{SdkError, SdkResult};
use url::Url;

/// Model used when `MODEL_NAME` is unset.
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1-Distill-Qwen-7B";

/// MCP endpoint used when `MCP_SERVER_URL` is unset.
pub const DEFAULT_MCP_SERVER_URL: &str = "http://localhost:3001/sse";

/// Configuration shared by the function-calling and intent-router agents.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Bearer token for the chat-completion service.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API, without a trailing slash.
    pub base_url: String,
    /// Model identifier sent with every completion request.
    pub model: String,
    /// SSE endpoint of the MCP server.
    pub mcp_server_url: Url,
}

impl AgentConfig {
    /// Read the configuration from the process environment.
    ///
    /// `OPENAI_API_KEY` and `OPENAI_BASE_URL` are required; `MODEL_NAME` and
    /// `MCP_SERVER_URL` fall back to [`DEFAULT_MODEL`] and
    /// [`DEFAULT_MCP_SERVER_URL`].
    pub fn from_env() -> SdkResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AgentConfig::from_env`] over an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> SdkResult<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| {
                    SdkError::Config(format!(
                        "Missing environment variable {}. Please ensure you have created .env file or set the environment variable.",
                        key
                    ))
                })
        };

        let api_key = required("OPENAI_API_KEY")?;
        let base_url = required("OPENAI_BASE_URL")?.trim_end_matches('/').to_string();
        let model = lookup("MODEL_NAME")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let mcp_server_url = lookup("MCP_SERVER_URL")
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_MCP_SERVER_URL.to_string());

        Ok(Self {
            api_key,
            base_url,
            model,
            mcp_server_url: Url::parse(&mcp_server_url)?,
        })
    }
}

/// Load `.env` from the working directory if one exists.
pub fn load_dotenv() {
    match dotenv::dotenv() {
        Ok(path) => tracing::debug!(path = %path.display(), "Loaded environment file"),
        Err(e) => tracing::debug!(error = %e, "No environment file loaded"),
    }
}

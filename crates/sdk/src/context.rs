//! Handles shared by one agent run: the chat client and the MCP session.

use crate::client::ClientSession;
use crate::config::AgentConfig;
use crate::error::SdkResult;
use crate::llm::{ChatClient, ChatMessage, ChatRequest, ChatResponse, OpenAiClient};
use crate::transport::SseTransport;
use std::sync::Arc;
use toolwire_core::protocol::Implementation;
use tracing::{info, warn};

/// Constructed once at startup and passed to every exchange.
#[derive(Clone)]
pub struct AgentContext {
    chat: Arc<dyn ChatClient>,
    session: Arc<ClientSession>,
    model: String,
}

impl AgentContext {
    pub fn new(chat: Arc<dyn ChatClient>, session: Arc<ClientSession>, model: impl Into<String>) -> Self {
        Self {
            chat,
            session,
            model: model.into(),
        }
    }

    /// Build the OpenAI-compatible client and open an initialized SSE
    /// session to `config.mcp_server_url`.
    pub async fn connect(config: &AgentConfig, client_name: &str) -> SdkResult<Self> {
        info!(url = %config.mcp_server_url, "Connecting to MCP server");
        let transport = SseTransport::new(config.mcp_server_url.clone());
        let session = ClientSession::connect(
            transport,
            Implementation::new(client_name, env!("CARGO_PKG_VERSION")),
        )
        .await?;

        Ok(Self::new(
            Arc::new(OpenAiClient::from_config(config)),
            Arc::new(session),
            config.model.clone(),
        ))
    }

    pub fn session(&self) -> &ClientSession {
        &self.session
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// A request for this context's model
    pub fn request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest::new(&self.model, messages)
    }

    pub async fn complete(&self, request: &ChatRequest) -> SdkResult<ChatResponse> {
        self.chat.complete(request).await
    }

    /// Log the server's resource templates; failures are only warnings.
    pub async fn log_resource_templates(&self) {
        match self.session.list_resource_templates().await {
            Ok(list) => {
                for template in &list.resource_templates {
                    info!(name = %template.name, uri_template = %template.uri_template, "Resource template");
                }
            }
            Err(e) => warn!(error = %e, "Could not list resource templates"),
        }
    }

    pub async fn shutdown(&self) -> SdkResult<()> {
        self.session.close().await
    }
}

// MCP (Model Context Protocol) server side: registries, dispatch and sessions

pub mod resources;
pub mod server;
pub mod session;
pub mod stdio;
pub mod tools;

pub use server::{McpServer, McpServerBuilder};
pub use session::{ServerSession, SessionError, SessionState};
pub use toolwire_core::protocol;

use toolwire_core::template::TemplateError;

/// Registration and lookup failures of the tool/resource registries
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool '{0}' is already registered")]
    DuplicateTool(String),

    #[error("Resource '{0}' is already registered")]
    DuplicateResource(String),

    #[error("Invalid resource template: {0}")]
    InvalidTemplate(#[from] TemplateError),

    #[error("Tool {0} not found")]
    UnknownTool(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),
}

//! Error types for the Toolwire SDK.

use serde_json::Value;
use toolwire_core::protocol::{JsonRpcError, ProtocolError};

/// Result type for SDK operations.
pub type SdkResult<T> = Result<T, SdkError>;

/// Error types that can occur on the client side of a session or while
/// talking to the chat-completion service.
#[derive(Debug, thiserror::Error)]
pub enum SdkError {
    /// Transport could not be established.
    #[error("Connection error: {0}")]
    Connection(String),

    /// The transport closed before (or while) the operation ran.
    #[error("Channel closed")]
    ChannelClosed,

    /// A frame could not be delivered.
    #[error("Write error: {0}")]
    Write(String),

    /// The server answered with a JSON-RPC error.
    #[error("MCP error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// A model-proposed tool call carried malformed JSON arguments.
    #[error("Could not parse tool arguments: {0}")]
    ArgumentParse(String),

    /// The intent classifier did not return the expected JSON object.
    #[error("Could not parse intent: {0}")]
    IntentParse(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Operation arguments failed validation; carries the rejected object.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(Value),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// A frame that is not valid JSON-RPC.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl SdkError {
    /// Create an API error from a status code and response body.
    pub fn from_response(status: u16, body: &str) -> Self {
        Self::Api {
            status,
            message: body.to_string(),
        }
    }

    /// True when the session can no longer be used.
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::ChannelClosed)
    }
}

impl From<JsonRpcError> for SdkError {
    fn from(error: JsonRpcError) -> Self {
        Self::Rpc {
            code: error.code,
            message: error.message,
        }
    }
}

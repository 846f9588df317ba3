//! Transport layer for MCP client sessions.

pub mod sse;
pub mod stdio;

pub use sse::SseTransport;
pub use stdio::StdioTransport;

use crate::error::SdkResult;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Inbound frames buffered before the transport's reader waits
pub(crate) const INBOUND_CAPACITY: usize = 64;

/// A bidirectional, in-order channel of JSON-RPC frames.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish the channel.
    ///
    /// The returned receiver yields inbound frames in receipt order and
    /// ends when the peer goes away or [`Transport::close`] is called.
    async fn connect(&mut self) -> SdkResult<mpsc::Receiver<String>>;

    /// Deliver one frame. Only valid after `connect` succeeded.
    async fn send(&self, frame: String) -> SdkResult<()>;

    /// Release the channel. Calling it more than once is not an error.
    async fn close(&self) -> SdkResult<()>;
}

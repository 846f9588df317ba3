// Server-side protocol session: one per connected transport

use crate::server::McpServer;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::mpsc;
use toolwire_core::protocol::{JsonRpcError, JsonRpcMessage, JsonRpcResponse, ProtocolError};
use toolwire_core::SessionId;
use tracing::{debug, warn};

/// Outbound frames buffered per session before `send` waits
const OUTBOUND_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connected,
    /// At least one request is being routed
    Dispatching,
    Closed,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {0} is closed")]
    Closed(SessionId),

    #[error("Session {0} is already connected")]
    AlreadyConnected(SessionId),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

enum Lifecycle {
    Idle,
    Open(mpsc::Sender<String>),
    Closed,
}

/// Owns the outbound half of one transport and routes inbound frames to
/// the shared [`McpServer`].
///
/// Requests may be dispatched concurrently; each response carries the id
/// of its request, so completion order is irrelevant to the peer.
pub struct ServerSession {
    id: SessionId,
    server: McpServer,
    lifecycle: Mutex<Lifecycle>,
    in_flight: AtomicUsize,
}

impl ServerSession {
    pub fn new(id: SessionId, server: McpServer) -> Self {
        Self {
            id,
            server,
            lifecycle: Mutex::new(Lifecycle::Idle),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Attach the transport. The returned receiver yields every outbound
    /// frame and ends when the session closes.
    pub fn connect(&self) -> Result<mpsc::Receiver<String>, SessionError> {
        let mut lifecycle = self.lock();
        match *lifecycle {
            Lifecycle::Idle => {
                let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
                *lifecycle = Lifecycle::Open(tx);
                debug!(session = %self.id, "Session connected");
                Ok(rx)
            }
            Lifecycle::Open(_) => Err(SessionError::AlreadyConnected(self.id.clone())),
            Lifecycle::Closed => Err(SessionError::Closed(self.id.clone())),
        }
    }

    pub fn state(&self) -> SessionState {
        match *self.lock() {
            Lifecycle::Idle => SessionState::Idle,
            Lifecycle::Closed => SessionState::Closed,
            Lifecycle::Open(_) if self.in_flight.load(Ordering::SeqCst) > 0 => {
                SessionState::Dispatching
            }
            Lifecycle::Open(_) => SessionState::Connected,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(*self.lock(), Lifecycle::Closed)
    }

    /// Close the session. Returns `true` only for the call that performed
    /// the transition, so repeated closes are harmless.
    pub fn close(&self) -> bool {
        let mut lifecycle = self.lock();
        if matches!(*lifecycle, Lifecycle::Closed) {
            return false;
        }
        *lifecycle = Lifecycle::Closed;
        debug!(session = %self.id, "Session closed");
        true
    }

    /// Queue a frame for the peer
    pub async fn send(&self, message: JsonRpcMessage) -> Result<(), SessionError> {
        let frame = message.to_frame()?;
        let sender = match &*self.lock() {
            Lifecycle::Open(tx) => tx.clone(),
            _ => return Err(SessionError::Closed(self.id.clone())),
        };

        sender
            .send(frame)
            .await
            .map_err(|_| SessionError::Closed(self.id.clone()))
    }

    /// Parse and dispatch one raw inbound frame.
    ///
    /// Malformed frames are answered with a JSON-RPC parse error. Frames
    /// arriving after close are dropped.
    pub async fn handle_frame(&self, frame: &str) -> Result<(), SessionError> {
        match JsonRpcMessage::parse(frame) {
            Ok(message) => self.dispatch(message).await,
            Err(e) => {
                warn!(session = %self.id, error = %e, "Rejecting malformed frame");
                let response = JsonRpcResponse::error(None, JsonRpcError::parse_error(e.to_string()));
                self.send(response.into()).await
            }
        }
    }

    /// Route an already parsed frame and send back its response, if any
    pub async fn dispatch(&self, message: JsonRpcMessage) -> Result<(), SessionError> {
        if self.is_closed() {
            warn!(session = %self.id, "Dropping frame received after close");
            return Ok(());
        }

        let request = match message {
            JsonRpcMessage::Request(request) => request,
            JsonRpcMessage::Response(response) => {
                debug!(session = %self.id, id = ?response.id, "Ignoring response from client");
                return Ok(());
            }
        };

        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let response = self.server.handle_request(request).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match response {
            Some(response) => self.send(response.into()).await,
            None => Ok(()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::demo_server;
    use serde_json::json;
    use toolwire_core::protocol::{error_codes, methods, JsonRpcRequest, RequestId};

    fn session() -> ServerSession {
        ServerSession::new(SessionId::new(), demo_server("test", "0.1.0", "").unwrap())
    }

    fn response(frame: &str) -> JsonRpcResponse {
        match JsonRpcMessage::parse(frame).unwrap() {
            JsonRpcMessage::Response(response) => response,
            other => panic!("expected a response, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let session = session();
        assert_eq!(session.state(), SessionState::Idle);

        let _rx = session.connect().unwrap();
        assert_eq!(session.state(), SessionState::Connected);
        assert!(matches!(
            session.connect(),
            Err(SessionError::AlreadyConnected(_))
        ));

        assert!(session.close());
        assert_eq!(session.state(), SessionState::Closed);
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let session = session();
        let mut rx = session.connect().unwrap();

        assert!(session.close());
        assert!(!session.close());
        assert!(!session.close());

        // outbound stream ends exactly once
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_request_round_trip() {
        let session = session();
        let mut rx = session.connect().unwrap();

        let request = JsonRpcRequest::new(
            9,
            methods::TOOLS_CALL,
            Some(json!({"name": "add", "arguments": {"a": 2, "b": 3}})),
        );
        session.dispatch(request.into()).await.unwrap();

        let reply = response(&rx.recv().await.unwrap());
        assert_eq!(reply.id, Some(RequestId::Number(9)));
        assert_eq!(reply.into_result().unwrap()["content"][0]["text"], "5");
        assert_eq!(session.state(), SessionState::Connected);
    }

    #[tokio::test]
    async fn test_malformed_frame_gets_parse_error() {
        let session = session();
        let mut rx = session.connect().unwrap();

        session.handle_frame("{not json").await.unwrap();

        let reply = response(&rx.recv().await.unwrap());
        assert_eq!(reply.id, None);
        assert_eq!(reply.into_result().unwrap_err().code, error_codes::PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_notifications_get_no_reply() {
        let session = session();
        let mut rx = session.connect().unwrap();

        session
            .handle_frame(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .unwrap();
        session.close();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_frames_after_close_are_ignored() {
        let session = session();
        let _rx = session.connect().unwrap();
        session.close();

        let result = session
            .handle_frame(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#)
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let session = session();
        let _rx = session.connect().unwrap();
        session.close();

        let message = JsonRpcResponse::success(Some(RequestId::Number(1)), json!({}));
        let err = session.send(message.into()).await.unwrap_err();
        assert!(matches!(err, SessionError::Closed(_)));
    }
}

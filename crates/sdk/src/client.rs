//! Client side of an MCP session.

use crate::error::{SdkError, SdkResult};
use crate::transport::Transport;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use toolwire_core::protocol::*;
use toolwire_core::{CallToolResult, ReadResourceResult};
use tracing::{debug, info, warn};

type Slot = oneshot::Sender<SdkResult<Value>>;

/// Correlation id -> waiting caller. `None` once the channel has closed.
struct PendingCalls {
    slots: Mutex<Option<HashMap<RequestId, Slot>>>,
}

impl PendingCalls {
    fn new() -> Self {
        Self {
            slots: Mutex::new(Some(HashMap::new())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<HashMap<RequestId, Slot>>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn insert(&self, id: RequestId, slot: Slot) -> SdkResult<()> {
        match self.lock().as_mut() {
            Some(slots) => {
                slots.insert(id, slot);
                Ok(())
            }
            None => Err(SdkError::ChannelClosed),
        }
    }

    fn remove(&self, id: &RequestId) -> Option<Slot> {
        self.lock().as_mut().and_then(|slots| slots.remove(id))
    }

    fn len(&self) -> usize {
        self.lock().as_ref().map_or(0, HashMap::len)
    }

    /// Fail every waiting caller and refuse new ones
    fn close(&self) {
        let Some(slots) = self.lock().take() else {
            return;
        };
        if !slots.is_empty() {
            warn!(pending = slots.len(), "Channel closed with calls in flight");
        }
        for (_, slot) in slots {
            let _ = slot.send(Err(SdkError::ChannelClosed));
        }
    }
}

/// An initialized (or at least connected) MCP session.
///
/// Calls may be issued concurrently from several tasks; each one waits on
/// its own correlation id, so responses may arrive in any order. There is
/// no timeout: a call waits until its response arrives or the channel
/// closes.
pub struct ClientSession {
    transport: Arc<dyn Transport>,
    pending: Arc<PendingCalls>,
    next_id: AtomicI64,
    receiver: Mutex<Option<JoinHandle<()>>>,
    server: Mutex<Option<InitializeResult>>,
    closed: AtomicBool,
}

impl ClientSession {
    /// Connect `transport` and start the receive loop, without the
    /// `initialize` handshake.
    pub async fn start<T: Transport + 'static>(mut transport: T) -> SdkResult<Self> {
        let inbound = transport.connect().await?;
        let transport: Arc<dyn Transport> = Arc::new(transport);
        let pending = Arc::new(PendingCalls::new());

        let receiver = tokio::spawn(receive_loop(inbound, pending.clone(), transport.clone()));

        Ok(Self {
            transport,
            pending,
            next_id: AtomicI64::new(1),
            receiver: Mutex::new(Some(receiver)),
            server: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    /// Connect and perform the `initialize` handshake.
    pub async fn connect<T: Transport + 'static>(
        transport: T,
        client_info: Implementation,
    ) -> SdkResult<Self> {
        let session = Self::start(transport).await?;
        session.initialize(client_info).await?;
        Ok(session)
    }

    /// Send `initialize`, then the `notifications/initialized` notification.
    pub async fn initialize(&self, client_info: Implementation) -> SdkResult<InitializeResult> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info,
        };
        let result: InitializeResult = self
            .request(methods::INITIALIZE, Some(serde_json::to_value(params)?))
            .await?;
        self.notify(methods::INITIALIZED, None).await?;

        info!(
            server = %result.server_info.name,
            version = %result.server_info.version,
            protocol = %result.protocol_version,
            "MCP session initialized"
        );
        *self.server.lock().unwrap_or_else(|e| e.into_inner()) = Some(result.clone());
        Ok(result)
    }

    /// Server identity from the handshake, if it has happened
    pub fn server_info(&self) -> Option<Implementation> {
        self.server
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|result| result.server_info.clone())
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> SdkResult<CallToolResult> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments: Some(arguments),
        };
        self.request(methods::TOOLS_CALL, Some(serde_json::to_value(params)?))
            .await
    }

    pub async fn read_resource(&self, uri: &str) -> SdkResult<ReadResourceResult> {
        let params = ReadResourceParams {
            uri: uri.to_string(),
        };
        self.request(methods::RESOURCES_READ, Some(serde_json::to_value(params)?))
            .await
    }

    pub async fn list_tools(&self) -> SdkResult<ListToolsResult> {
        self.request(methods::TOOLS_LIST, None).await
    }

    pub async fn list_resources(&self) -> SdkResult<ListResourcesResult> {
        self.request(methods::RESOURCES_LIST, None).await
    }

    pub async fn list_resource_templates(&self) -> SdkResult<ListResourceTemplatesResult> {
        self.request(methods::RESOURCES_TEMPLATES_LIST, None).await
    }

    pub async fn ping(&self) -> SdkResult<()> {
        let _: Value = self.request(methods::PING, None).await?;
        Ok(())
    }

    /// Number of calls waiting for a response
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    /// Issue a request and wait for the response with the same id.
    pub async fn request<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> SdkResult<R> {
        let id = RequestId::Number(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (slot, result) = oneshot::channel();
        self.pending.insert(id.clone(), slot)?;

        let frame = JsonRpcMessage::from(JsonRpcRequest::new(id.clone(), method, params)).to_frame()?;
        debug!(id = %id, method, "Sending request");
        if let Err(e) = self.transport.send(frame).await {
            self.pending.remove(&id);
            return Err(e);
        }

        let value = result.await.map_err(|_| SdkError::ChannelClosed)??;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn notify(&self, method: &str, params: Option<Value>) -> SdkResult<()> {
        let frame = JsonRpcMessage::from(JsonRpcRequest::notification(method, params)).to_frame()?;
        self.transport.send(frame).await
    }

    /// Close the transport and fail any calls still waiting. Idempotent.
    pub async fn close(&self) -> SdkResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.pending.close();
        let result = self.transport.close().await;
        if let Some(receiver) = self.receiver.lock().unwrap_or_else(|e| e.into_inner()).take() {
            receiver.abort();
        }
        result
    }
}

async fn receive_loop(
    mut inbound: mpsc::Receiver<String>,
    pending: Arc<PendingCalls>,
    transport: Arc<dyn Transport>,
) {
    while let Some(frame) = inbound.recv().await {
        let message = match JsonRpcMessage::parse(&frame) {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Dropping malformed frame from server");
                continue;
            }
        };

        match message {
            JsonRpcMessage::Response(response) => resolve(&pending, response),
            JsonRpcMessage::Request(request) if request.is_notification() => {
                debug!(method = %request.method, "Ignoring server notification");
            }
            JsonRpcMessage::Request(request) => {
                debug!(method = %request.method, "Rejecting server request");
                let reply = JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::method_not_found(&request.method),
                );
                let sent = match JsonRpcMessage::from(reply).to_frame() {
                    Ok(frame) => transport.send(frame).await,
                    Err(e) => Err(e.into()),
                };
                if let Err(e) = sent {
                    warn!(error = %e, "Failed to answer server request");
                }
            }
        }
    }

    debug!("Inbound channel ended");
    pending.close();
}

fn resolve(pending: &PendingCalls, response: JsonRpcResponse) {
    let Some(id) = response.id.clone() else {
        warn!(error = ?response.error, "Dropping response without id");
        return;
    };
    match pending.remove(&id) {
        Some(slot) => {
            let _ = slot.send(response.into_result().map_err(SdkError::from));
        }
        None => warn!(id = %id, "Dropping response with no pending call"),
    }
}

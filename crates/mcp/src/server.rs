// MCP request dispatcher shared by every session of one server process

use crate::resources::{ResourceHandler, ResourceRegistry};
use crate::tools::{Tool, ToolRegistry};
use crate::RegistryError;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use toolwire_core::protocol::*;
use tracing::{debug, info};

/// Read-only after construction; cloning shares the same registries.
#[derive(Clone)]
pub struct McpServer {
    inner: Arc<ServerInner>,
}

struct ServerInner {
    info: Implementation,
    tools: ToolRegistry,
    resources: ResourceRegistry,
}

impl McpServer {
    pub fn builder(name: impl Into<String>, version: impl Into<String>) -> McpServerBuilder {
        McpServerBuilder {
            info: Implementation::new(name, version),
            tools: ToolRegistry::new(),
            resources: ResourceRegistry::new(),
        }
    }

    pub fn info(&self) -> &Implementation {
        &self.inner.info
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.inner.tools
    }

    pub fn resources(&self) -> &ResourceRegistry {
        &self.inner.resources
    }

    /// Route one request. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!(method = %request.method, id = ?request.id, "Dispatching request");

        if request.is_notification() {
            self.handle_notification(&request);
            return None;
        }

        let id = request.id.clone();
        let outcome = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(&request),
            methods::PING => Ok(serde_json::json!({})),
            methods::TOOLS_LIST => to_value(ListToolsResult {
                tools: self.inner.tools.list_schemas(),
            }),
            methods::TOOLS_CALL => self.handle_tools_call(&request).await,
            methods::RESOURCES_LIST => to_value(ListResourcesResult::default()),
            methods::RESOURCES_TEMPLATES_LIST => to_value(ListResourceTemplatesResult {
                resource_templates: self.inner.resources.list_templates(),
            }),
            methods::RESOURCES_READ => self.handle_resources_read(&request).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_notification(&self, request: &JsonRpcRequest) {
        match request.method.as_str() {
            methods::INITIALIZED => info!("MCP client initialized"),
            other => debug!(method = other, "Ignoring notification"),
        }
    }

    fn handle_initialize(&self, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        let params: InitializeParams = request
            .parse_params()
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;

        info!(
            client = %params.client_info.name,
            client_version = %params.client_info.version,
            protocol = %params.protocol_version,
            "MCP client connected"
        );

        to_value(InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ListChangedCapability::default()),
                resources: Some(ListChangedCapability::default()),
            },
            server_info: self.inner.info.clone(),
        })
    }

    async fn handle_tools_call(&self, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        let params: CallToolParams = request
            .parse_params()
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;

        match self.inner.tools.invoke(&params.name, params.arguments).await {
            Ok(result) => to_value(result),
            Err(e @ RegistryError::UnknownTool(_)) => Err(JsonRpcError::invalid_params(e.to_string())),
            Err(e) => Err(JsonRpcError::internal_error(e.to_string())),
        }
    }

    async fn handle_resources_read(&self, request: &JsonRpcRequest) -> Result<Value, JsonRpcError> {
        let params: ReadResourceParams = request
            .parse_params()
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;

        match self.inner.resources.read(&params.uri).await {
            Ok(result) => to_value(result),
            Err(RegistryError::ResourceNotFound(uri)) => Err(JsonRpcError::resource_not_found(&uri)),
            Err(e) => Err(JsonRpcError::internal_error(e.to_string())),
        }
    }
}

fn to_value(result: impl Serialize) -> Result<Value, JsonRpcError> {
    serde_json::to_value(result).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

/// Collects tools and resource templates; any clash fails the build
pub struct McpServerBuilder {
    info: Implementation,
    tools: ToolRegistry,
    resources: ResourceRegistry,
}

impl McpServerBuilder {
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Result<Self, RegistryError> {
        self.tools.register(tool)?;
        Ok(self)
    }

    pub fn resource(
        mut self,
        name: impl Into<String>,
        template: &str,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<Self, RegistryError> {
        self.resources.register(name, template, None, handler)?;
        Ok(self)
    }

    pub fn build(self) -> McpServer {
        info!(
            server = %self.info.name,
            tools = self.tools.len(),
            resources = self.resources.len(),
            "MCP server configured"
        );
        McpServer {
            inner: Arc::new(ServerInner {
                info: self.info,
                tools: self.tools,
                resources: self.resources,
            }),
        }
    }
}

/// The demo server: an addition tool and a greeting resource.
///
/// `prefix` namespaces both names, e.g. `sse-` gives `sse-add` and
/// `sse-greeting://{name}`.
pub fn demo_server(name: &str, version: &str, prefix: &str) -> Result<McpServer, RegistryError> {
    let greeting = format!("{}greeting", prefix);
    Ok(McpServer::builder(name, version)
        .tool(Arc::new(crate::tools::AddTool::new(format!("{}add", prefix))))?
        .resource(
            greeting.clone(),
            &format!("{}://{{name}}", greeting),
            Arc::new(crate::resources::GreetingResource),
        )?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolwire_core::{CallToolResult, ReadResourceResult};

    fn request(id: i64, method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest::new(id, method, Some(params))
    }

    async fn call(server: &McpServer, method: &str, params: Value) -> JsonRpcResponse {
        server
            .handle_request(request(1, method, params))
            .await
            .expect("requests always get a response")
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = demo_server("test-server", "0.1.0", "").unwrap();
        let response = call(
            &server,
            methods::INITIALIZE,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {},
                "clientInfo": {"name": "test", "version": "0.0.1"}
            }),
        )
        .await;

        let result: InitializeResult =
            serde_json::from_value(response.into_result().unwrap()).unwrap();
        assert_eq!(result.server_info.name, "test-server");
        assert_eq!(result.protocol_version, PROTOCOL_VERSION);
        assert!(result.capabilities.tools.is_some());
    }

    #[tokio::test]
    async fn test_call_add_tool() {
        let server = demo_server("test-server", "0.1.0", "sse-").unwrap();
        let response = call(
            &server,
            methods::TOOLS_CALL,
            json!({"name": "sse-add", "arguments": {"a": 4, "b": 4}}),
        )
        .await;

        let result: CallToolResult =
            serde_json::from_value(response.into_result().unwrap()).unwrap();
        assert_eq!(result.first_text(), Some("8"));
    }

    #[tokio::test]
    async fn test_bad_arguments_are_a_result_not_an_rpc_error() {
        let server = demo_server("test-server", "0.1.0", "").unwrap();
        let response = call(
            &server,
            methods::TOOLS_CALL,
            json!({"name": "add", "arguments": {"a": "four"}}),
        )
        .await;

        let result: CallToolResult =
            serde_json::from_value(response.into_result().unwrap()).unwrap();
        assert!(result.is_error());
    }

    #[tokio::test]
    async fn test_unknown_tool_is_invalid_params() {
        let server = demo_server("test-server", "0.1.0", "").unwrap();
        let response = call(&server, methods::TOOLS_CALL, json!({"name": "nope"})).await;
        let error = response.into_result().unwrap_err();
        assert_eq!(error.code, error_codes::INVALID_PARAMS);
        assert_eq!(error.message, "Tool nope not found");
    }

    #[tokio::test]
    async fn test_read_greeting_resource() {
        let server = demo_server("test-server", "0.1.0", "sse-").unwrap();
        let response = call(
            &server,
            methods::RESOURCES_READ,
            json!({"uri": "sse-greeting://Lucy"}),
        )
        .await;

        let result: ReadResourceResult =
            serde_json::from_value(response.into_result().unwrap()).unwrap();
        assert_eq!(result.first_text(), Some("Hello, Lucy!"));
        assert_eq!(result.contents[0].uri, "sse-greeting://Lucy");
    }

    #[tokio::test]
    async fn test_unmatched_resource_is_not_found() {
        let server = demo_server("test-server", "0.1.0", "sse-").unwrap();
        let response = call(
            &server,
            methods::RESOURCES_READ,
            json!({"uri": "greeting://Lucy"}),
        )
        .await;
        let error = response.into_result().unwrap_err();
        assert_eq!(error.code, error_codes::RESOURCE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_listing() {
        let server = demo_server("test-server", "0.1.0", "sse-").unwrap();

        let tools: ListToolsResult = serde_json::from_value(
            call(&server, methods::TOOLS_LIST, json!({})).await.into_result().unwrap(),
        )
        .unwrap();
        assert_eq!(tools.tools.len(), 1);
        assert_eq!(tools.tools[0].name, "sse-add");

        let templates: ListResourceTemplatesResult = serde_json::from_value(
            call(&server, methods::RESOURCES_TEMPLATES_LIST, json!({}))
                .await
                .into_result()
                .unwrap(),
        )
        .unwrap();
        assert_eq!(
            templates.resource_templates[0].uri_template,
            "sse-greeting://{name}"
        );

        let resources: ListResourcesResult = serde_json::from_value(
            call(&server, methods::RESOURCES_LIST, json!({})).await.into_result().unwrap(),
        )
        .unwrap();
        assert!(resources.resources.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_method_and_notifications() {
        let server = demo_server("test-server", "0.1.0", "").unwrap();
        let error = call(&server, "prompts/list", json!({}))
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(error.code, error_codes::METHOD_NOT_FOUND);

        let notification = JsonRpcRequest::notification(methods::INITIALIZED, None);
        assert!(server.handle_request(notification).await.is_none());
    }

    #[test]
    fn test_duplicate_tool_fails_at_build_time() {
        let result = McpServer::builder("dup", "0.0.0")
            .tool(Arc::new(crate::tools::AddTool::new("add")))
            .and_then(|b| b.tool(Arc::new(crate::tools::AddTool::new("add"))));
        assert!(matches!(result, Err(RegistryError::DuplicateTool(_))));
    }
}

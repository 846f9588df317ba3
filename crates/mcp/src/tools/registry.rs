// Tool registry: name -> schema-validated handler

use crate::RegistryError;
use anyhow::Result;
use futures::FutureExt;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use toolwire_core::protocol::ToolSchema;
use toolwire_core::schema::ParamSchema;
use toolwire_core::CallToolResult;

/// Static description of a tool
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: Option<String>,
    pub params: ParamSchema,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, params: ParamSchema) -> Self {
        Self {
            name: name.into(),
            description: None,
            params,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Get the tool schema for MCP
    pub fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.params.to_json_schema(),
        }
    }
}

/// Tool executor trait
///
/// Handlers are shared by every session on the server and may run
/// concurrently. A handler that keeps state must synchronize it itself.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with arguments already validated against `definition().params`
    async fn execute(&self, arguments: Map<String, Value>) -> Result<CallToolResult>;
}

struct RegisteredTool {
    definition: ToolDefinition,
    tool: Arc<dyn Tool>,
}

/// Tool registry for managing available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; names are unique for the lifetime of the registry
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let definition = tool.definition();
        if self.tools.contains_key(&definition.name) {
            return Err(RegistryError::DuplicateTool(definition.name));
        }

        tracing::debug!(tool = %definition.name, "Registered tool");
        self.order.push(definition.name.clone());
        self.tools
            .insert(definition.name.clone(), RegisteredTool { definition, tool });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// List all tool schemas in registration order
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.definition.schema())
            .collect()
    }

    /// Validate `arguments` and run the named tool.
    ///
    /// Only an unknown name is an `Err`. Schema violations and handler
    /// failures (including panics) come back as `isError` results.
    pub async fn invoke(
        &self,
        name: &str,
        arguments: Option<Value>,
    ) -> Result<CallToolResult, RegistryError> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| RegistryError::UnknownTool(name.to_string()))?;

        let arguments = arguments.unwrap_or(Value::Null);
        let validated = match entry.definition.params.validate(&arguments) {
            Ok(args) => args,
            Err(e) => {
                tracing::debug!(tool = name, error = %e, "Rejected tool arguments");
                return Ok(CallToolResult::error(format!(
                    "Invalid arguments for tool {}: {}",
                    name, e
                )));
            }
        };

        match AssertUnwindSafe(entry.tool.execute(validated))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(e)) => {
                tracing::warn!(tool = name, error = %e, "Tool handler failed");
                Ok(CallToolResult::error(format!("Tool {} failed: {:#}", name, e)))
            }
            Err(_) => {
                tracing::error!(tool = name, "Tool handler panicked");
                Ok(CallToolResult::error(format!("Tool {} panicked", name)))
            }
        }
    }
}

//! Function-calling loop: the model proposes a call, the MCP session runs
//! it, the model phrases the result.

use crate::client::ClientSession;
use crate::context::AgentContext;
use crate::error::{SdkError, SdkResult};
use crate::llm::{ChatMessage, ToolCall, ToolDescriptor};
use serde_json::{json, Map, Value};
use std::fmt;
use std::str::FromStr;
use toolwire_core::OperationResult;
use tracing::{debug, info, warn};

pub const ARGUMENT_PARSE_FAILED: &str = "Error parsing tool arguments";
pub const UNKNOWN_TOOL: &str = "Tool not found";
pub const NO_RESPONSE: &str = "No response from model";

const TEMPERATURE: f32 = 0.01;
const TOP_P: f32 = 0.95;

/// The closed catalog of functions offered to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BridgeTool {
    /// `sse-add {a, b}` -> `tools/call sse-add`
    SseAdd,
    /// `get-greeting {name}` -> `resources/read sse-greeting://{name}`
    GetGreeting,
}

impl BridgeTool {
    pub const ALL: [BridgeTool; 2] = [BridgeTool::SseAdd, BridgeTool::GetGreeting];

    pub fn name(self) -> &'static str {
        match self {
            Self::SseAdd => "sse-add",
            Self::GetGreeting => "get-greeting",
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        match self {
            Self::SseAdd => ToolDescriptor::function(
                self.name(),
                "Compute the sum of two numbers using the sse-add tool",
                json!({
                    "type": "object",
                    "properties": {
                        "a": {"type": "number", "description": "A number"},
                        "b": {"type": "number", "description": "A number"}
                    },
                    "required": ["a", "b"]
                }),
            ),
            Self::GetGreeting => ToolDescriptor::function(
                self.name(),
                "Get a personalized greeting for someone using the greeting URI",
                json!({
                    "type": "object",
                    "properties": {
                        "name": {"type": "string", "description": "Person name to greet"}
                    },
                    "required": ["name"]
                }),
            ),
        }
    }

    pub fn catalog() -> Vec<ToolDescriptor> {
        Self::ALL.iter().map(|tool| tool.descriptor()).collect()
    }

    /// Run the matching MCP operation
    pub async fn execute(
        self,
        session: &ClientSession,
        arguments: Map<String, Value>,
    ) -> SdkResult<OperationResult> {
        match self {
            Self::SseAdd => Ok(session.call_tool("sse-add", Value::Object(arguments)).await?.into()),
            Self::GetGreeting => {
                let name = arguments.get("name").and_then(Value::as_str).unwrap_or_default();
                let uri = format!("sse-greeting://{}", name);
                debug!(uri = %uri, "Reading greeting resource");
                Ok(session.read_resource(&uri).await?.into())
            }
        }
    }

    /// Text inserted into the conversation for an executed call
    fn result_text(self, outcome: SdkResult<OperationResult>) -> String {
        match (self, outcome) {
            (_, Ok(result)) => match result.first_text() {
                Some(text) => text.to_string(),
                None => self.empty_result_text().to_string(),
            },
            (Self::SseAdd, Err(e)) => format!("Tool call failed: {}", e),
            (Self::GetGreeting, Err(e)) => format!("Error retrieving greeting: {}", e),
        }
    }

    fn empty_result_text(self) -> &'static str {
        match self {
            Self::SseAdd => "Error processing tool result",
            Self::GetGreeting => "No greeting text available",
        }
    }
}

impl fmt::Display for BridgeTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BridgeTool {
    type Err = SdkError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.name() == name)
            .ok_or_else(|| SdkError::UnknownOperation(name.to_string()))
    }
}

/// Parse a model-proposed argument payload; only JSON objects are accepted.
pub fn parse_arguments(raw: &str) -> SdkResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(arguments)) => Ok(arguments),
        Ok(other) => Err(SdkError::ArgumentParse(format!("expected an object, got {}", other))),
        Err(e) => Err(SdkError::ArgumentParse(e.to_string())),
    }
}

/// Execute one proposed call and return the text for the tool message.
///
/// Never fails: every problem becomes a readable string the model can
/// react to.
pub async fn handle_tool_call(session: &ClientSession, call: &ToolCall) -> String {
    info!(tool = %call.function.name, arguments = %call.function.arguments, "Tool call received");

    let arguments = match parse_arguments(&call.function.arguments) {
        Ok(arguments) => arguments,
        Err(e) => {
            warn!(error = %e, "Rejecting tool call");
            return ARGUMENT_PARSE_FAILED.to_string();
        }
    };

    let tool = match call.function.name.parse::<BridgeTool>() {
        Ok(tool) => tool,
        Err(e) => {
            warn!(error = %e, "Model proposed an unknown tool");
            return UNKNOWN_TOOL.to_string();
        }
    };

    let outcome = tool.execute(session, arguments).await;
    if let Err(ref e) = outcome {
        warn!(tool = %tool, error = %e, "Tool call failed");
    }
    tool.result_text(outcome)
}

/// One exchange: ask with the catalog, run at most the first proposed
/// call, ask again with its result.
pub async fn run_exchange(ctx: &AgentContext, prompt: &str) -> SdkResult<String> {
    let mut messages = vec![ChatMessage::user(prompt)];

    let request = ctx
        .request(messages.clone())
        .with_temperature(TEMPERATURE)
        .with_top_p(TOP_P)
        .with_tools(BridgeTool::catalog());
    let response = ctx.complete(&request).await?;

    let Some(message) = response.message() else {
        return Ok(NO_RESPONSE.to_string());
    };
    let Some(call) = message.tool_calls().first() else {
        debug!("No tool calls in response");
        return Ok(message.text().unwrap_or(NO_RESPONSE).to_string());
    };
    if message.tool_calls().len() > 1 {
        warn!(proposed = message.tool_calls().len(), "Only the first tool call is executed");
    }

    let result = handle_tool_call(ctx.session(), call).await;
    debug!(result = %result, "Tool result");

    messages.push(message.clone());
    messages.push(ChatMessage::tool(&call.id, result));

    let request = ctx
        .request(messages)
        .with_temperature(TEMPERATURE)
        .with_top_p(TOP_P);
    let response = ctx.complete(&request).await?;
    Ok(response.text().unwrap_or(NO_RESPONSE).to_string())
}

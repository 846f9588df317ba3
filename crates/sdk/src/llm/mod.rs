//! Chat-completion types and the client seam used by the agents.

pub mod openai;

pub use openai::OpenAiClient;

use crate::error::SdkResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A message in a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Links a tool-role message to the call it answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Reasoning models put their answer here when `content` is empty.
    /// Never sent back to the service.
    #[serde(default, skip_serializing)]
    pub reasoning_content: Option<String>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
            reasoning_content: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Result of the tool call `call_id`
    pub fn tool(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }

    /// Answer text, falling back to `reasoning_content`
    pub fn text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|text| !text.is_empty())
            .or_else(|| self.reasoning_content.as_deref().filter(|text| !text.is_empty()))
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.tool_calls.as_deref().unwrap_or_default()
    }
}

/// A function call proposed by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_type")]
    pub kind: String,
    pub function: FunctionCall,
}

impl ToolCall {
    pub fn function(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: function_type(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    /// Raw JSON text; may be malformed
    pub arguments: String,
}

fn function_type() -> String {
    "function".to_string()
}

/// Function descriptor offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: FunctionDescriptor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl ToolDescriptor {
    pub fn function(name: impl Into<String>, description: impl Into<String>, parameters: Value) -> Self {
        Self {
            kind: function_type(),
            function: FunctionDescriptor {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: String,
}

impl ResponseFormat {
    pub fn json_object() -> Self {
        Self {
            kind: "json_object".to_string(),
        }
    }
}

/// Chat-completion request body
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDescriptor>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            top_p: None,
            tools: None,
            response_format: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn with_tools(mut self, tools: Vec<ToolDescriptor>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl ChatResponse {
    /// The first choice's message
    pub fn message(&self) -> Option<&ChatMessage> {
        self.choices.first().map(|choice| &choice.message)
    }

    pub fn text(&self) -> Option<&str> {
        self.message().and_then(ChatMessage::text)
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        self.message().map(ChatMessage::tool_calls).unwrap_or_default()
    }
}

/// A chat-completion service
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn complete(&self, request: &ChatRequest) -> SdkResult<ChatResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(message: Value) -> ChatResponse {
        serde_json::from_value(json!({"choices": [{"message": message}]})).unwrap()
    }

    #[test]
    fn test_text_prefers_content() {
        let r = response(json!({"role": "assistant", "content": "8", "reasoning_content": "think"}));
        assert_eq!(r.text(), Some("8"));
    }

    #[test]
    fn test_text_falls_back_to_reasoning() {
        let r = response(json!({"role": "assistant", "content": null, "reasoning_content": "{\"a\":1}"}));
        assert_eq!(r.text(), Some("{\"a\":1}"));

        let r = response(json!({"role": "assistant", "content": "", "reasoning_content": "x"}));
        assert_eq!(r.text(), Some("x"));
    }

    #[test]
    fn test_empty_response() {
        let r: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(r.text().is_none());
        assert!(r.tool_calls().is_empty());
    }

    #[test]
    fn test_tool_message_shape() {
        let value = serde_json::to_value(ChatMessage::tool("call_1", "8")).unwrap();
        assert_eq!(value, json!({"role": "tool", "content": "8", "tool_call_id": "call_1"}));
    }

    #[test]
    fn test_reasoning_is_not_sent_back() {
        let r = response(json!({
            "role": "assistant",
            "content": null,
            "reasoning_content": "hmm",
            "tool_calls": [{"id": "c1", "type": "function", "function": {"name": "sse-add", "arguments": "{}"}}]
        }));
        let value = serde_json::to_value(r.message().unwrap()).unwrap();
        assert!(value.get("reasoning_content").is_none());
        assert_eq!(value["tool_calls"][0]["function"]["name"], "sse-add");
    }

    #[test]
    fn test_request_omits_unset_fields() {
        let request = ChatRequest::new("m", vec![ChatMessage::user("hi")])
            .with_temperature(0.01)
            .with_top_p(0.95);
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("tools").is_none());
        assert!(value.get("response_format").is_none());
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "hi"}));
    }
}

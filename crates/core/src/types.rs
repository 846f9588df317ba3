use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of one live transport on the server side
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SessionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One unit of tool output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
    /// Any other kind (`audio`, `resource`, ...); its payload is dropped
    #[serde(other)]
    Unknown,
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::Text {
            text: format!("Error: {}", text.into()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

/// Result envelope of `tools/call`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default, skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl CallToolResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::text(text)],
            is_error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::error(message)],
            is_error: Some(true),
        }
    }

    pub fn is_error(&self) -> bool {
        self.is_error.unwrap_or(false)
    }

    /// First text-bearing content item, if any
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(ToolContent::as_text)
    }
}

/// One item of a resource read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceContents {
    pub uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
}

impl ResourceContents {
    pub fn text(uri: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            text: Some(text.into()),
            mime_type: None,
        }
    }
}

/// Result envelope of `resources/read`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadResourceResult {
    #[serde(default)]
    pub contents: Vec<ResourceContents>,
}

impl ReadResourceResult {
    pub fn first_text(&self) -> Option<&str> {
        self.contents.iter().find_map(|c| c.text.as_deref())
    }
}

/// Outcome of a protocol operation issued on behalf of a model.
///
/// Tool calls and resource reads use different envelopes on the wire; callers
/// that only need the text payload go through [`OperationResult::first_text`].
#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    Tool(CallToolResult),
    Resource(ReadResourceResult),
}

impl OperationResult {
    pub fn first_text(&self) -> Option<&str> {
        match self {
            Self::Tool(result) => result.first_text(),
            Self::Resource(result) => result.first_text(),
        }
    }

    /// A result with zero items is "no content", not a failure
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Tool(result) => result.content.is_empty(),
            Self::Resource(result) => result.contents.is_empty(),
        }
    }
}

impl From<CallToolResult> for OperationResult {
    fn from(result: CallToolResult) -> Self {
        Self::Tool(result)
    }
}

impl From<ReadResourceResult> for OperationResult {
    fn from(result: ReadResourceResult) -> Self {
        Self::Resource(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tool_result_wire_shape() {
        let result = CallToolResult::success("8");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"content": [{"type": "text", "text": "8"}]})
        );

        let error = CallToolResult::error("boom");
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["isError"], true);
        assert_eq!(json["content"][0]["text"], "Error: boom");
    }

    #[test]
    fn test_resource_result_wire_shape() {
        let json = serde_json::json!({
            "contents": [{"uri": "greeting://Lucy", "text": "Hello, Lucy!"}]
        });
        let result: ReadResourceResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.first_text(), Some("Hello, Lucy!"));
    }

    #[test]
    fn test_first_text_skips_non_text_items() {
        let result = CallToolResult {
            content: vec![
                ToolContent::Image {
                    data: "aGk=".to_string(),
                    mime_type: "image/png".to_string(),
                },
                ToolContent::text("caption"),
            ],
            is_error: None,
        };
        assert_eq!(result.first_text(), Some("caption"));
    }

    #[test]
    fn test_unknown_content_kinds_are_tolerated() {
        let json = serde_json::json!({
            "content": [
                {"type": "resource", "resource": {"uri": "file:///a.txt", "text": "a"}},
                {"type": "audio", "data": "AAAA", "mimeType": "audio/wav"},
                {"type": "text", "text": "8"}
            ]
        });
        let result: CallToolResult = serde_json::from_value(json).unwrap();
        assert_eq!(result.content.len(), 3);
        assert_eq!(result.content[0], ToolContent::Unknown);
        assert_eq!(result.first_text(), Some("8"));
    }

    #[test]
    fn test_operation_result_uniform_text_access() {
        let tool: OperationResult = CallToolResult::success("8").into();
        let resource: OperationResult = ReadResourceResult {
            contents: vec![ResourceContents::text("sse-greeting://Lucy", "Hello, Lucy!")],
        }
        .into();

        assert_eq!(tool.first_text(), Some("8"));
        assert_eq!(resource.first_text(), Some("Hello, Lucy!"));
    }

    #[test]
    fn test_empty_result_is_no_content() {
        let empty = OperationResult::Tool(CallToolResult::default());
        assert!(empty.is_empty());
        assert_eq!(empty.first_text(), None);

        let empty = OperationResult::Resource(ReadResourceResult::default());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionId::new(), SessionId::new());
    }
}

// Arithmetic demo tool

use crate::tools::{Tool, ToolDefinition};
use anyhow::Result;
use serde::Deserialize;
use serde_json::{Map, Value};
use toolwire_core::schema::{ParamKind, ParamSchema};
use toolwire_core::CallToolResult;

/// Adds two numbers and returns the sum as text
pub struct AddTool {
    name: String,
}

impl AddTool {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Deserialize)]
struct AddArgs {
    a: f64,
    b: f64,
}

#[async_trait::async_trait]
impl Tool for AddTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            self.name.clone(),
            ParamSchema::new()
                .required("a", ParamKind::Number, "A number")
                .required("b", ParamKind::Number, "A number"),
        )
        .with_description("A tool that adds two numbers")
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<CallToolResult> {
        let args: AddArgs = serde_json::from_value(Value::Object(arguments))?;
        // f64 Display already drops a zero fraction: 4 + 4 prints as "8"
        Ok(CallToolResult::success((args.a + args.b).to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_integral_sum_has_no_fraction() {
        let tool = AddTool::new("add");
        let result = tool.execute(args(json!({"a": 4, "b": 4}))).await.unwrap();
        assert_eq!(result.first_text(), Some("8"));
    }

    #[tokio::test]
    async fn test_fractional_sum() {
        let tool = AddTool::new("add");
        let result = tool.execute(args(json!({"a": 1.5, "b": 2}))).await.unwrap();
        assert_eq!(result.first_text(), Some("3.5"));

        let result = tool.execute(args(json!({"a": -3, "b": 1}))).await.unwrap();
        assert_eq!(result.first_text(), Some("-2"));
    }

    #[test]
    fn test_definition_uses_configured_name() {
        let definition = AddTool::new("sse-add").definition();
        assert_eq!(definition.name, "sse-add");
        assert_eq!(
            definition.schema().input_schema["required"],
            json!(["a", "b"])
        );
    }
}

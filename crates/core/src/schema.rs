// Declared parameter schemas for tools and their JSON Schema rendering

use serde_json::{Map, Value};

/// JSON type a parameter must have
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Number,
    Integer,
    Boolean,
    Object,
    Array,
}

impl ParamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object => "object",
            Self::Array => "array",
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Boolean => value.is_boolean(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: String,
    pub kind: ParamKind,
    pub description: Option<String>,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SchemaError {
    #[error("Arguments must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("Missing required argument '{0}'")]
    Missing(String),

    #[error("Argument '{name}' must be of type {expected}")]
    WrongType { name: String, expected: ParamKind },
}

/// Named, typed parameters with a required subset.
///
/// Unknown keys are tolerated and passed through untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamSchema {
    params: Vec<ParamSpec>,
}

impl ParamSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.with(name, kind, description, true)
    }

    pub fn optional(self, name: &str, kind: ParamKind, description: &str) -> Self {
        self.with(name, kind, description, false)
    }

    fn with(mut self, name: &str, kind: ParamKind, description: &str, required: bool) -> Self {
        self.params.push(ParamSpec {
            name: name.to_string(),
            kind,
            description: (!description.is_empty()).then(|| description.to_string()),
            required,
        });
        self
    }

    /// Check `args` against the declared parameters
    pub fn validate(&self, args: &Value) -> Result<Map<String, Value>, SchemaError> {
        let object = match args {
            Value::Object(map) => map,
            Value::Null => return self.validate(&Value::Object(Map::new())),
            other => return Err(SchemaError::NotAnObject(json_type_name(other))),
        };

        for param in &self.params {
            match object.get(&param.name) {
                None | Some(Value::Null) if param.required => {
                    return Err(SchemaError::Missing(param.name.clone()));
                }
                None | Some(Value::Null) => {}
                Some(value) if !param.kind.matches(value) => {
                    return Err(SchemaError::WrongType {
                        name: param.name.clone(),
                        expected: param.kind,
                    });
                }
                Some(_) => {}
            }
        }

        Ok(object.clone())
    }

    /// Render as a JSON Schema object (the `inputSchema` / function `parameters` shape)
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            let mut property = Map::new();
            property.insert("type".to_string(), Value::from(param.kind.as_str()));
            if let Some(description) = &param.description {
                property.insert("description".to_string(), Value::from(description.as_str()));
            }
            properties.insert(param.name.clone(), Value::Object(property));
        }

        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name.as_str())
            .collect();

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required
        })
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn add_schema() -> ParamSchema {
        ParamSchema::new()
            .required("a", ParamKind::Number, "A number")
            .required("b", ParamKind::Number, "A number")
    }

    #[test]
    fn test_accepts_valid_arguments() {
        let args = add_schema().validate(&json!({"a": 4, "b": 4.5})).unwrap();
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn test_rejects_every_malformed_argument_set() {
        let schema = add_schema();
        let malformed = [
            json!({}),
            json!({"a": 1}),
            json!({"b": 1}),
            json!({"a": "1", "b": 2}),
            json!({"a": 1, "b": true}),
            json!({"a": null, "b": 2}),
            json!([1, 2]),
            json!("a=1,b=2"),
            json!(42),
        ];

        for args in malformed {
            assert!(schema.validate(&args).is_err(), "accepted {}", args);
        }
    }

    #[test]
    fn test_error_messages_name_the_argument() {
        let err = add_schema().validate(&json!({"a": 1})).unwrap_err();
        assert_eq!(err, SchemaError::Missing("b".to_string()));
        assert_eq!(err.to_string(), "Missing required argument 'b'");

        let err = add_schema().validate(&json!({"a": "x", "b": 1})).unwrap_err();
        assert_eq!(err.to_string(), "Argument 'a' must be of type number");
    }

    #[test]
    fn test_optional_parameters_and_null_arguments() {
        let schema = ParamSchema::new().optional("limit", ParamKind::Integer, "");
        assert!(schema.validate(&Value::Null).is_ok());
        assert!(schema.validate(&json!({"limit": 3})).is_ok());
        assert!(schema.validate(&json!({"limit": 3.5})).is_err());
    }

    #[test]
    fn test_json_schema_rendering() {
        let schema = ParamSchema::new().required("name", ParamKind::String, "Person name to greet");
        assert_eq!(
            schema.to_json_schema(),
            json!({
                "type": "object",
                "properties": {
                    "name": {"type": "string", "description": "Person name to greet"}
                },
                "required": ["name"]
            })
        );
    }
}

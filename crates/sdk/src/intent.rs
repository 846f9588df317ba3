//! Natural-language intent router: classify, validate, execute, phrase.

use crate::client::ClientSession;
use crate::context::AgentContext;
use crate::error::{SdkError, SdkResult};
use crate::llm::{ChatMessage, ResponseFormat};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use toolwire_core::OperationResult;
use tracing::{debug, error, info, warn};

/// An operation the router can dispatch to.
///
/// `validate` runs before any network call; `execute` is only reached
/// with parameters it accepted.
#[async_trait]
pub trait Operation: Send + Sync {
    fn name(&self) -> &str;

    /// One line for the classifier prompt, e.g. which parameters to extract
    fn describe(&self) -> &str;

    fn validate(&self, params: &Value) -> bool;

    async fn execute(&self, session: &ClientSession, params: &Value) -> SdkResult<OperationResult>;
}

/// `add {a, b}` -> `tools/call sse-add`
pub struct AddOperation;

#[async_trait]
impl Operation for AddOperation {
    fn name(&self) -> &str {
        "add"
    }

    fn describe(&self) -> &str {
        "addition of two numbers; extract the numeric parameters a and b"
    }

    fn validate(&self, params: &Value) -> bool {
        params["a"].is_number() && params["b"].is_number()
    }

    async fn execute(&self, session: &ClientSession, params: &Value) -> SdkResult<OperationResult> {
        let arguments = json!({ "a": params["a"], "b": params["b"] });
        Ok(session.call_tool("sse-add", arguments).await?.into())
    }
}

/// `greeting {name}` -> `resources/read sse-greeting://{name}`
pub struct GreetingOperation;

#[async_trait]
impl Operation for GreetingOperation {
    fn name(&self) -> &str {
        "greeting"
    }

    fn describe(&self) -> &str {
        "greet someone; extract the parameter name"
    }

    fn validate(&self, params: &Value) -> bool {
        params["name"]
            .as_str()
            .is_some_and(|name| !name.trim().is_empty())
    }

    async fn execute(&self, session: &ClientSession, params: &Value) -> SdkResult<OperationResult> {
        let name = params["name"].as_str().unwrap_or_default();
        Ok(session
            .read_resource(&format!("sse-greeting://{}", name))
            .await?
            .into())
    }
}

/// Operation name -> operation. Adding an operation never touches the
/// dispatch code.
#[derive(Default, Clone)]
pub struct OperationRegistry {
    operations: BTreeMap<String, Arc<dyn Operation>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `add` and `greeting`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(AddOperation));
        registry.register(Arc::new(GreetingOperation));
        registry
    }

    pub fn register(&mut self, operation: Arc<dyn Operation>) {
        let name = operation.name().to_string();
        if self.operations.insert(name.clone(), operation).is_some() {
            warn!(operation = %name, "Replaced existing operation");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Operation>> {
        self.operations.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.operations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Look up, validate, then execute
    pub async fn execute(
        &self,
        session: &ClientSession,
        name: &str,
        params: &Value,
    ) -> SdkResult<OperationResult> {
        let operation = self
            .get(name)
            .ok_or_else(|| SdkError::UnknownOperation(name.to_string()))?;
        if !operation.validate(params) {
            return Err(SdkError::InvalidArguments(params.clone()));
        }
        operation.execute(session, params).await
    }
}

/// Classifier output: `{"operation": string, "params": object}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Intent {
    pub operation: String,
    #[serde(default)]
    pub params: Value,
}

impl Intent {
    /// Strict parse of the classifier's reply
    pub fn parse(text: &str) -> SdkResult<Self> {
        serde_json::from_str(text.trim()).map_err(|e| SdkError::IntentParse(format!("{}: {}", e, text)))
    }
}

pub struct IntentRouter {
    registry: OperationRegistry,
}

impl Default for IntentRouter {
    fn default() -> Self {
        Self::new(OperationRegistry::with_defaults())
    }
}

impl IntentRouter {
    pub fn new(registry: OperationRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &OperationRegistry {
        &self.registry
    }

    fn classifier_prompt(&self) -> String {
        let mut prompt = String::from(
            "You are an assistant that parses user intent.\n\
             Analyse the user input and decide which operation the user wants and its parameters.\n\
             Supported operations:\n",
        );
        for (n, name) in self.registry.names().enumerate() {
            let description = self.registry.get(name).map_or("", |op| op.describe());
            prompt.push_str(&format!("{}. {} - {}\n", n + 1, name, description));
        }
        prompt.push_str(
            "\nReply with a JSON object with exactly these fields:\n\
             - operation: string, the operation name\n\
             - params: object, the parameters the operation needs\n\
             For example \"help me compute 3 plus 5\" must return {\"operation\": \"add\", \"params\": {\"a\": 3, \"b\": 5}}\n\
             and \"say hello to Ming\" must return {\"operation\": \"greeting\", \"params\": {\"name\": \"Ming\"}}.\n\
             The JSON must be strict and valid, without extra whitespace or line breaks.",
        );
        prompt
    }

    /// Ask the model which operation `input` means
    pub async fn classify(&self, ctx: &AgentContext, input: &str) -> SdkResult<Intent> {
        let request = ctx
            .request(vec![
                ChatMessage::system(self.classifier_prompt()),
                ChatMessage::user(input),
            ])
            .with_temperature(0.01)
            .with_top_p(0.95)
            .with_response_format(ResponseFormat::json_object());

        let response = ctx.complete(&request).await?;
        let intent = Intent::parse(response.text().unwrap_or("{}"))?;
        info!(operation = %intent.operation, params = %intent.params, "Intent identified");
        Ok(intent)
    }

    pub async fn execute(&self, ctx: &AgentContext, intent: &Intent) -> SdkResult<OperationResult> {
        self.registry
            .execute(ctx.session(), &intent.operation, &intent.params)
            .await
    }

    /// Ask the model to turn an operation result into a friendly reply
    pub async fn phrase(&self, ctx: &AgentContext, input: &str, result: &str) -> SdkResult<String> {
        let request = ctx
            .request(vec![
                ChatMessage::system(
                    "You are a friendly assistant who turns operation results into natural language replies.",
                ),
                ChatMessage::user(format!(
                    "The user said: {:?}. The operation result is: {}. Please write a friendly reply.",
                    input,
                    Value::from(result)
                )),
            ])
            .with_temperature(0.7);

        let response = ctx.complete(&request).await?;
        Ok(response
            .text()
            .unwrap_or("Sorry, I could not generate a reply.")
            .to_string())
    }

    /// Classify, execute and phrase, surfacing the first failure
    pub async fn try_process(&self, ctx: &AgentContext, input: &str) -> SdkResult<String> {
        debug!(input, "Processing input");
        let intent = self.classify(ctx, input).await?;
        let result = self.execute(ctx, &intent).await?;
        let text = result.first_text().unwrap_or_default();
        info!(result = %text, "Operation result");
        self.phrase(ctx, input, text).await
    }

    /// Like [`IntentRouter::try_process`], but every failure becomes a
    /// user-facing error string.
    pub async fn process(&self, ctx: &AgentContext, input: &str) -> String {
        match self.try_process(ctx, input).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Failed to process request");
                format!("Error processing request: {}", e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_validation() {
        let add = AddOperation;
        assert!(add.validate(&json!({"a": 3, "b": 5})));
        assert!(add.validate(&json!({"a": 3.5, "b": -1})));
        assert!(!add.validate(&json!({"a": "3", "b": 5})));
        assert!(!add.validate(&json!({"a": 3})));
        assert!(!add.validate(&Value::Null));
    }

    #[test]
    fn test_greeting_validation() {
        let greeting = GreetingOperation;
        assert!(greeting.validate(&json!({"name": "Alice"})));
        assert!(!greeting.validate(&json!({"name": "   "})));
        assert!(!greeting.validate(&json!({"name": 7})));
        assert!(!greeting.validate(&json!({})));
    }

    #[test]
    fn test_intent_parse() {
        let intent = Intent::parse(r#"{"operation": "add", "params": {"a": 3, "b": 5}}"#).unwrap();
        assert_eq!(intent.operation, "add");
        assert_eq!(intent.params, json!({"a": 3, "b": 5}));

        assert!(matches!(
            Intent::parse(r#"{"params": {"a": 3}}"#),
            Err(SdkError::IntentParse(_))
        ));
        assert!(matches!(Intent::parse("add 3 5"), Err(SdkError::IntentParse(_))));
    }

    #[test]
    fn test_registry_is_additive() {
        struct Echo;

        #[async_trait]
        impl Operation for Echo {
            fn name(&self) -> &str {
                "echo"
            }
            fn describe(&self) -> &str {
                "repeat text"
            }
            fn validate(&self, params: &Value) -> bool {
                params["text"].is_string()
            }
            async fn execute(&self, _session: &ClientSession, _params: &Value) -> SdkResult<OperationResult> {
                unreachable!("not executed in this test")
            }
        }

        let mut registry = OperationRegistry::with_defaults();
        registry.register(Arc::new(Echo));
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["add", "echo", "greeting"]);

        let prompt = IntentRouter::new(registry).classifier_prompt();
        assert!(prompt.contains("2. echo - repeat text"));
    }
}

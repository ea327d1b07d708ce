//! Tool Catalog and Dispatcher
//!
//! Static registry describing each callable tool, plus the dispatch boundary
//! that maps a decoded function name to a registered tool and executes it.
//! Tools are registered once at startup and read-only thereafter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Result;

/// Parameter definition for a tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,

    /// Documented default, supplied by the dispatcher when the argument
    /// is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Tool definition schema (shown to the model in phase-1 prompts)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// Serialize the parameter list as a JSON Schema object, the form the
    /// model sees in the tool catalog.
    pub fn parameters_json(&self) -> Value {
        let mut properties = Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({ "type": param.param_type }),
            );
            if param.required {
                required.push(Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add a new capability
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema for catalog construction
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments, returning output text.
    ///
    /// Configuration problems (missing API key, unset document id) are
    /// reported as ordinary output text, not errors; only genuine execution
    /// failures return `Err`.
    async fn execute(&self, arguments: &Map<String, Value>) -> Result<String>;
}

/// Outcome of a dispatch, inspected by the orchestrator.
///
/// Dispatch never propagates an error: a failing executor is absorbed here
/// and reported as a `Failed` string that flows into phase-2 context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Tool executed and produced output text
    Output(String),

    /// Tool executor failed; carries a `Tool error: ...` marker string
    Failed(String),

    /// Function name absent or unregistered; nothing was executed
    NoOp,
}

/// Registry for available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let schema = tool.schema();
        self.tools.insert(schema.name, Arc::new(tool));
    }

    /// Get a tool by exact name match
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Get all tool schemas (for phase-1 prompt construction)
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema()).collect()
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute the named tool with the given arguments.
    ///
    /// Missing optional arguments receive their documented defaults from the
    /// tool schema before execution. An unregistered name is a `NoOp`, not
    /// an error.
    pub async fn dispatch(&self, name: &str, arguments: &Map<String, Value>) -> Dispatch {
        let Some(tool) = self.get(name) else {
            tracing::debug!(function = name, "no registered tool, dispatch is a no-op");
            return Dispatch::NoOp;
        };

        let mut args = arguments.clone();
        for param in tool.schema().parameters {
            if let Some(default) = param.default {
                args.entry(param.name).or_insert(default);
            }
        }

        match tool.execute(&args).await {
            Ok(output) => Dispatch::Output(output),
            Err(e) => {
                tracing::warn!(function = name, error = %e, "tool execution failed");
                Dispatch::Failed(format!("Tool error: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "echo".into(),
                description: "Echo back the text argument".into(),
                parameters: vec![ParameterSchema {
                    name: "text".into(),
                    param_type: "string".into(),
                    description: "Text to echo".into(),
                    required: false,
                    default: Some(serde_json::json!("default text")),
                }],
            }
        }

        async fn execute(&self, arguments: &Map<String, Value>) -> Result<String> {
            let text = arguments.get("text").and_then(Value::as_str).unwrap_or("");
            Ok(format!("echo: {text}"))
        }
    }

    struct FailingTool;

    #[async_trait]
    impl Tool for FailingTool {
        fn schema(&self) -> ToolSchema {
            ToolSchema {
                name: "broken".into(),
                description: "Always fails".into(),
                parameters: vec![],
            }
        }

        async fn execute(&self, _arguments: &Map<String, Value>) -> Result<String> {
            Err(AgentError::ToolExecution("backend exploded".into()))
        }
    }

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(EchoTool);
        registry.register(FailingTool);
        registry
    }

    #[test]
    fn test_registry_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("echo").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_parameters_json_shape() {
        let schema = EchoTool.schema();
        let params = schema.parameters_json();
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["text"]["type"], "string");
        assert_eq!(params["required"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_dispatch_returns_tool_output() {
        let registry = registry();
        let mut args = Map::new();
        args.insert("text".into(), serde_json::json!("hi"));

        let outcome = registry.dispatch("echo", &args).await;
        assert_eq!(outcome, Dispatch::Output("echo: hi".into()));
    }

    #[tokio::test]
    async fn test_dispatch_fills_documented_default() {
        let registry = registry();
        let outcome = registry.dispatch("echo", &Map::new()).await;
        assert_eq!(outcome, Dispatch::Output("echo: default text".into()));
    }

    #[tokio::test]
    async fn test_dispatch_unregistered_is_noop() {
        let registry = registry();
        let outcome = registry.dispatch("get_stock_price", &Map::new()).await;
        assert_eq!(outcome, Dispatch::NoOp);
    }

    #[tokio::test]
    async fn test_dispatch_absorbs_executor_failure() {
        let registry = registry();
        let outcome = registry.dispatch("broken", &Map::new()).await;
        match outcome {
            Dispatch::Failed(msg) => assert!(msg.starts_with("Tool error: ")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}

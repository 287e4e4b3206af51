//! In-Process Tool Registry
//!
//! Registration shim that exposes pipeline capabilities to in-process
//! callers (agent code, an MCP bridge) as named tools taking and returning
//! JSON. Handlers are plain closures, with no transport or schema layer.

use crate::retrieval::Retriever;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Errors from tool dispatch.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error("tool {tool} failed: {message}")]
    Execution { tool: String, message: String },
}

/// A registered tool handler: JSON arguments in, JSON result out.
pub type ToolHandler = Box<dyn Fn(Value) -> Result<Value, ToolError> + Send + Sync>;

/// Name-to-handler registry.
#[derive(Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any previous registration.
    pub fn register(&mut self, name: &str, handler: ToolHandler) {
        debug!(tool = name, "Registered tool");
        self.tools.insert(name.to_string(), handler);
    }

    /// Invoke a tool by name.
    pub fn invoke(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let handler = self
            .tools
            .get(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        handler(args)
    }

    /// Registered tool names, sorted.
    pub fn list(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }
}

/// Register `vector.search` backed by a shared retriever.
///
/// Arguments: `{"query": string, "k": integer (default 5)}`.
/// Result: `{"results": [{"score": float, "metadata": {...}}, ...]}`.
pub fn register_vector_search(registry: &mut ToolRegistry, retriever: Arc<Retriever>) {
    registry.register(
        "vector.search",
        Box::new(move |args: Value| {
            let query = args
                .get("query")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidArguments {
                    tool: "vector.search".to_string(),
                    message: "missing string field 'query'".to_string(),
                })?;
            let k = args.get("k").and_then(Value::as_u64).unwrap_or(5) as usize;

            let results = retriever
                .search(query, k)
                .map_err(|e| ToolError::Execution {
                    tool: "vector.search".to_string(),
                    message: e.to_string(),
                })?;

            let hits: Vec<Value> = results
                .into_iter()
                .map(|r| json!({"score": r.score, "metadata": r.metadata}))
                .collect();
            Ok(json!({ "results": hits }))
        }),
    );
}

/// Register `graph.query` as a passthrough stub.
///
/// The graph driver is an external collaborator; until one is wired in,
/// this echoes the statement with an empty row set so agent code can be
/// exercised end-to-end.
pub fn register_graph_query(registry: &mut ToolRegistry) {
    registry.register(
        "graph.query",
        Box::new(|args: Value| {
            let statement = args
                .get("statement")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolError::InvalidArguments {
                    tool: "graph.query".to_string(),
                    message: "missing string field 'statement'".to_string(),
                })?;
            Ok(json!({"statement": statement, "rows": []}))
        }),
    );
}

//! Agent Placeholders
//!
//! Scaffolding for the downstream multi-agent workflow. These hold no logic
//! yet; they fix the call surfaces (orchestrate, analyze, retrieve,
//! generate) so the pipeline can be wired end-to-end before real agent
//! behavior lands.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Orchestrates the other agents for a user query.
#[derive(Debug, Default)]
pub struct MasterAgent;

/// Outcome of a master-agent run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunStatus {
    pub status: String,
    pub query: String,
}

impl MasterAgent {
    pub fn new() -> Self {
        Self
    }

    pub fn run(&self, query: &str) -> RunStatus {
        RunStatus {
            status: "running".to_string(),
            query: query.to_string(),
        }
    }
}

/// Analyzes queries and plans sub-tasks.
#[derive(Debug, Default)]
pub struct QueryAnalyzer;

/// Parsed intent for a query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryIntent {
    pub query: String,
    pub intent: String,
}

impl QueryAnalyzer {
    pub fn analyze(&self, query: &str) -> QueryIntent {
        QueryIntent {
            query: query.to_string(),
            intent: "analyze".to_string(),
        }
    }
}

/// Fetches data from the graph store, vector store, or sensor APIs.
#[derive(Debug, Default)]
pub struct DataRetriever;

/// Retrieval envelope: where the data came from and what was fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedData {
    pub source: String,
    pub query: String,
    pub data: Vec<Value>,
}

impl DataRetriever {
    pub fn retrieve(&self, source: &str, query: &str) -> RetrievedData {
        RetrievedData {
            source: source.to_string(),
            query: query.to_string(),
            data: Vec::new(),
        }
    }
}

/// Generates responses from templates and retrieved context.
#[derive(Debug, Default)]
pub struct GeneratorAgent;

/// Generated artifact plus the context it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub content: String,
    pub context: Value,
}

impl GeneratorAgent {
    pub fn generate(&self, context: Value) -> GeneratedContent {
        GeneratedContent {
            content: "generated".to_string(),
            context,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholder_surfaces() {
        let master = MasterAgent::new();
        assert_eq!(master.run("why is unit_1 vibrating").status, "running");

        let intent = QueryAnalyzer.analyze("failure modes");
        assert_eq!(intent.intent, "analyze");

        let retrieved = DataRetriever.retrieve("vector", "seal wear");
        assert_eq!(retrieved.source, "vector");
        assert!(retrieved.data.is_empty());

        let generated = GeneratorAgent.generate(json!({"hits": 2}));
        assert_eq!(generated.content, "generated");
        assert_eq!(generated.context["hits"], 2);
    }
}

//! Store tool trait and registry
//!
//! One tool per backing store. The registry is populated once at startup
//! from the adapters that report themselves configured; an adapter
//! without connection parameters is omitted rather than registered
//! broken, so the reasoning backend can never select a dead tool.

use crate::models::{RawResult, ToolDescriptor};
use crate::{AgentError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

pub mod document;
pub mod relational;

pub use document::DocumentStoreTool;
pub use relational::RelationalStoreTool;

/// One queryable backing store.
#[async_trait::async_trait]
pub trait StoreTool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// Whether connection parameters are present. Checked at registry
    /// construction and by the health aggregator; never runs a query.
    fn configured(&self) -> bool;
    async fn execute(&self, arguments: &Value) -> Result<RawResult>;
}

/// Fixed, name-keyed set of tools resolved through an explicit lookup.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn StoreTool>>,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            descriptors: Vec::new(),
        }
    }

    /// Build a registry from adapters, keeping only the configured ones.
    pub fn from_tools(tools: Vec<Arc<dyn StoreTool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            if tool.configured() {
                registry.register(tool);
            } else {
                warn!(tool = tool.name(), "Tool not configured, skipping");
            }
        }
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn StoreTool>) {
        self.descriptors.push(ToolDescriptor {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
        });
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn StoreTool>> {
        self.tools
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    pub fn list(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubTool {
        name: &'static str,
        configured: bool,
    }

    #[async_trait::async_trait]
    impl StoreTool for StubTool {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "stub"
        }

        fn configured(&self) -> bool {
            self.configured
        }

        async fn execute(&self, _arguments: &Value) -> Result<RawResult> {
            Ok(RawResult::Text("stub".to_string()))
        }
    }

    #[test]
    fn test_resolve_unknown_tool_fails_loudly() {
        let registry = ToolRegistry::new();
        let result = registry.resolve("nonexistent");
        match result {
            Err(AgentError::UnknownTool(name)) => assert_eq!(name, "nonexistent"),
            other => panic!("expected UnknownTool, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_from_tools_omits_unconfigured_adapters() {
        let registry = ToolRegistry::from_tools(vec![
            Arc::new(StubTool {
                name: "configured_store",
                configured: true,
            }),
            Arc::new(StubTool {
                name: "dead_store",
                configured: false,
            }),
        ]);

        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("configured_store").is_ok());
        assert!(registry.resolve("dead_store").is_err());
        assert_eq!(registry.list().len(), 1);
        assert_eq!(registry.list()[0].name, "configured_store");
    }

    #[test]
    fn test_descriptors_preserve_registration_order() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(StubTool {
            name: "first",
            configured: true,
        }));
        registry.register(Arc::new(StubTool {
            name: "second",
            configured: true,
        }));

        let names: Vec<&str> = registry.list().iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["first", "second"]);
    }
}

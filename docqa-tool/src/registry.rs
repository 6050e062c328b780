use std::collections::HashMap;
use std::sync::Arc;

use docqa_core::{Tool, ToolDeclaration, ToolError};
use serde_json::Value;
use tracing::debug;

/// Named tools available to a conversation.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Declarations for every registered tool, sorted by name so requests
    /// are stable across runs.
    pub fn declarations(&self) -> Vec<ToolDeclaration> {
        let mut decls: Vec<ToolDeclaration> =
            self.tools.values().map(|t| t.declaration()).collect();
        decls.sort_by(|a, b| a.name.cmp(&b.name));
        decls
    }

    /// Run the named tool.
    pub async fn dispatch(&self, name: &str, args: Value) -> Result<Value, ToolError> {
        let tool = self.get(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        debug!(tool = name, "dispatching tool call");
        tool.execute(args).await
    }
}

//! Callable tools over the catalog.
//!
//! A [`Tool`] takes JSON parameters and returns a JSON value. Tools are
//! collected in a [`ToolRegistry`], an ordinary value built at startup and
//! handed to whatever front end dispatches calls (the `catalog find`
//! command, or an embedding application).
//!
//! ```text
//! ┌──────────────────────────────┐
//! │         ToolRegistry         │
//! │  ┌──────────────┐ ┌────────┐ │
//! │  │ find_content │ │ custom │ │
//! │  └──────────────┘ └────────┘ │
//! └──────────────┬───────────────┘
//!                ▼
//!     execute(name, params, &ToolContext)
//! ```

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use crate::config::Config;
use crate::error::CatalogError;
use crate::search::{FuzzyRetriever, SearchParams, SearchResponse, TOOL_NAME};
use crate::store::Store;

#[async_trait]
pub trait Tool: Send + Sync {
    /// Lowercase identifier with underscores, unique within a registry.
    fn name(&self) -> &str;

    /// One-line description for callers deciding which tool to use.
    fn description(&self) -> &str;

    /// Whether this tool ships with the crate. Defaults to `false`.
    fn is_builtin(&self) -> bool {
        false
    }

    /// JSON Schema (`type: "object"`) describing the parameters.
    fn parameters_schema(&self) -> Value;

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value>;
}

/// What a tool can reach: the loaded config and the open store.
pub struct ToolContext {
    config: Arc<Config>,
    store: Arc<dyn Store>,
}

impl ToolContext {
    pub fn new(config: Arc<Config>, store: Arc<dyn Store>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in Tools
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindContentArgs {
    name: Option<String>,
    display_name: Option<String>,
    description: Option<String>,
    max_distance: Option<usize>,
    limit: Option<usize>,
}

/// Best-match lookup of a tutorial or help topic.
pub struct FindContentTool;

#[async_trait]
impl Tool for FindContentTool {
    fn name(&self) -> &str {
        TOOL_NAME
    }

    fn description(&self) -> &str {
        "Find the tutorial or help topic that best matches a name, display name, or description"
    }

    fn is_builtin(&self) -> bool {
        true
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "name": { "type": "string", "description": "Content item name" },
                "displayName": { "type": "string", "description": "Display name or title" },
                "description": { "type": "string", "description": "Description or body text" },
                "maxDistance": { "type": "integer", "description": "Maximum per-word edit distance", "default": 7 },
                "limit": { "type": "integer", "description": "Accepted for compatibility; the best match is returned", "default": 10 }
            }
        })
    }

    async fn execute(&self, params: Value, ctx: &ToolContext) -> Result<Value> {
        let args: FindContentArgs = if params.is_null() {
            FindContentArgs::default()
        } else {
            serde_json::from_value(params)?
        };

        let defaults = &ctx.config().retrieval;
        let request = SearchParams {
            name: args.name,
            display_name: args.display_name,
            description: args.description,
            max_edit_distance: args.max_distance.unwrap_or(defaults.max_edit_distance),
            limit: args.limit.unwrap_or(defaults.limit),
        };

        let response = match FuzzyRetriever::new(ctx.store()).search(&request).await {
            Ok(response) => response,
            Err(CatalogError::Validation(reason)) => SearchResponse::rejected(&request, &reason),
            Err(e) => return Err(e.into()),
        };

        Ok(serde_json::to_value(&response)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// A registry holding every built-in tool.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(FindContentTool));
        registry
    }

    /// Add a tool. Lookups return the first tool registered under a name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn execute(&self, name: &str, params: Value, ctx: &ToolContext) -> Result<Value> {
        match self.get(name) {
            Some(tool) => tool.execute(params, ctx).await,
            None => bail!("Unknown tool: {}", name),
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// CLI entry point: print every registered tool.
pub fn run_list_tools() {
    let registry = ToolRegistry::with_builtins();
    for tool in registry.tools() {
        let marker = if tool.is_builtin() { " (builtin)" } else { "" };
        println!("{}{}", tool.name(), marker);
        println!("    {}", tool.description());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContentConfig, DbConfig, RetrievalConfig};
    use crate::models::{ContentItem, ContentKind};
    use crate::store::memory::InMemoryStore;
    use serde_json::json;

    fn context(store: InMemoryStore) -> ToolContext {
        let config = Config {
            db: DbConfig {
                path: "unused.sqlite".into(),
            },
            content: ContentConfig::new("unused"),
            retrieval: RetrievalConfig {
                max_edit_distance: 3,
                ..RetrievalConfig::default()
            },
        };
        ToolContext::new(Arc::new(config), Arc::new(store))
    }

    async fn store_with_item() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .create_content_item(&ContentItem::new(
                "rhel-images",
                ContentKind::Tutorial,
                json!({ "spec": { "displayName": "Create RHEL images for deployment" } }),
            ))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_find_content_returns_response_json() {
        let ctx = context(store_with_item().await);
        let registry = ToolRegistry::with_builtins();

        let value = registry
            .execute(TOOL_NAME, json!({ "name": "rhel-images" }), &ctx)
            .await
            .unwrap();

        assert_eq!(value["tool"], "find_content");
        assert_eq!(value["result"]["matchType"], "exact_match");
        assert_eq!(value["result"]["item"]["name"], "rhel-images");
    }

    #[tokio::test]
    async fn test_defaults_come_from_config() {
        let ctx = context(store_with_item().await);
        let value = FindContentTool
            .execute(json!({ "displayName": "RHEL" }), &ctx)
            .await
            .unwrap();

        assert_eq!(value["searchParams"]["maxDistance"], 3);
        assert_eq!(value["searchParams"]["limit"], 10);
    }

    #[tokio::test]
    async fn test_missing_query_becomes_error_message() {
        let ctx = context(store_with_item().await);
        let value = FindContentTool.execute(json!({}), &ctx).await.unwrap();

        assert_eq!(
            value["message"],
            "Error: At least one search parameter (name, displayName, or description) must be provided"
        );
        assert!(value["result"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let ctx = context(InMemoryStore::new());
        let registry = ToolRegistry::with_builtins();
        let err = registry.execute("nope", json!({}), &ctx).await.unwrap_err();
        assert!(err.to_string().contains("Unknown tool"));
    }

    #[test]
    fn test_registry_builtins() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(registry.len(), 1);
        let tool = registry.get(TOOL_NAME).unwrap();
        assert!(tool.is_builtin());
        assert_eq!(tool.parameters_schema()["type"], "object");
        assert!(ToolRegistry::new().is_empty());
    }
}

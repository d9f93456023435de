//! Best-match content lookup.
//!
//! [`FuzzyRetriever`] scores every content item against the supplied
//! name, display name, and description queries and returns the single
//! lowest-scoring item. Scoring tiers are defined in [`crate::matcher`].
//!
//! When the store cannot compute edit distances the lookup degrades to a
//! case-insensitive containment check over the same fields, returns the
//! first hit, and marks the response with `fallback: true`.
//!
//! A lookup that matches nothing is a normal response with `result: null`,
//! never an error. Errors are reserved for a request without any query
//! field ([`CatalogError::Validation`]) and for store failures.

use anyhow::Result;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::config::{Config, RetrievalConfig};
use crate::db;
use crate::error::CatalogError;
use crate::matcher::{Field, FieldCondition, MatchExpr, MatchType, Scored};
use crate::models::ContentItem;
use crate::store::sqlite::SqliteStore;
use crate::store::Store;
use crate::tools::{ToolContext, ToolRegistry};

/// Tool name reported in every response.
pub const TOOL_NAME: &str = "find_content";

pub const MISSING_QUERY: &str =
    "At least one search parameter (name, displayName, or description) must be provided";

const NO_MATCH: &str = "No matching content found";

/// Lookup request. Echoed back verbatim in the response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchParams {
    pub name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "maxDistance")]
    pub max_edit_distance: usize,
    /// Accepted and echoed; only the best match is ever returned.
    pub limit: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::from_config(&RetrievalConfig::default())
    }
}

impl SearchParams {
    /// Empty request carrying the configured distance and limit.
    pub fn from_config(retrieval: &RetrievalConfig) -> Self {
        Self {
            name: None,
            display_name: None,
            description: None,
            max_edit_distance: retrieval.max_edit_distance,
            limit: retrieval.limit,
        }
    }

    fn queries(&self) -> impl Iterator<Item = (Field, &str)> {
        [
            (Field::Name, self.name.as_deref()),
            (Field::Title, self.display_name.as_deref()),
            (Field::Description, self.description.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, q)| q.map(str::trim).filter(|q| !q.is_empty()).map(|q| (field, q)))
    }

    /// One tiered condition per non-blank query field.
    pub fn match_expr(&self) -> MatchExpr {
        self.queries().fold(MatchExpr::new(), |expr, (field, q)| {
            expr.with(FieldCondition::tiered(field, q, self.max_edit_distance))
        })
    }

    fn summary(&self) -> String {
        self.queries()
            .map(|(_, q)| q)
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// The matched item and how it matched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    /// `None` on the fallback path, which does not score.
    pub score: Option<f64>,
    pub match_type: MatchType,
    pub item: ContentItem,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

impl SearchHit {
    fn new(item: ContentItem, score: Option<f64>, match_type: MatchType) -> Self {
        Self {
            score,
            match_type,
            display_name: item.display_name().map(str::to_string),
            description: item.description().map(str::to_string),
            item,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub tool: String,
    pub search_params: SearchParams,
    pub result: Option<SearchHit>,
    pub fallback: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl SearchResponse {
    fn new(params: &SearchParams, result: Option<SearchHit>, fallback: bool) -> Self {
        let message = result.is_none().then(|| NO_MATCH.to_string());
        Self {
            tool: TOOL_NAME.to_string(),
            search_params: params.clone(),
            result,
            fallback,
            message,
        }
    }

    /// Response for a request that was refused before touching the store.
    pub fn rejected(params: &SearchParams, reason: &str) -> Self {
        Self {
            tool: TOOL_NAME.to_string(),
            search_params: params.clone(),
            result: None,
            fallback: false,
            message: Some(format!("Error: {}", reason)),
        }
    }
}

pub struct FuzzyRetriever<'a> {
    store: &'a dyn Store,
}

impl<'a> FuzzyRetriever<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    pub async fn search(&self, params: &SearchParams) -> Result<SearchResponse, CatalogError> {
        let expr = params.match_expr();
        if expr.is_empty() {
            return Err(CatalogError::Validation(MISSING_QUERY.to_string()));
        }

        if !self.store.edit_distance_available() {
            return self.pattern_search(params, &expr).await;
        }

        let items = self
            .store
            .list_content_items()
            .await
            .map_err(|e| CatalogError::operation("search", "content_item", params.summary(), e))?;
        let candidates = items.len();

        let mut best: Option<(ContentItem, Scored)> = None;
        for item in items {
            let Some(scored) = expr.evaluate(&item) else {
                continue;
            };
            // Strict comparison keeps the earliest item on ties
            let better = best
                .as_ref()
                .map_or(true, |(_, current)| scored.score < current.score);
            if better {
                best = Some((item, scored));
            }
        }

        debug!(
            candidates,
            matched = best.is_some(),
            query = %params.summary(),
            "scored content items"
        );

        let hit = best.map(|(item, scored)| SearchHit::new(item, Some(scored.score), scored.match_type));
        Ok(SearchResponse::new(params, hit, false))
    }

    async fn pattern_search(
        &self,
        params: &SearchParams,
        expr: &MatchExpr,
    ) -> Result<SearchResponse, CatalogError> {
        debug!(query = %params.summary(), "edit distance unavailable, using pattern match");
        let item = self
            .store
            .pattern_search(&expr.to_pattern_query())
            .await
            .map_err(|e| CatalogError::operation("search", "content_item", params.summary(), e))?;

        let hit = item.map(|item| SearchHit::new(item, None, MatchType::PatternMatch));
        Ok(SearchResponse::new(params, hit, true))
    }
}

/// CLI entry point: run the lookup through the tool registry and print JSON.
pub async fn run_find(config: &Config, params: SearchParams) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone()).with_edit_distance(config.retrieval.edit_distance);
    let ctx = ToolContext::new(Arc::new(config.clone()), Arc::new(store));
    let registry = ToolRegistry::with_builtins();

    let args = serde_json::to_value(&params)?;
    let response = registry.execute(TOOL_NAME, args, &ctx).await;
    pool.close().await;

    println!("{}", serde_json::to_string_pretty(&response?)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;
    use crate::store::memory::InMemoryStore;
    use serde_json::json;

    fn tutorial(name: &str, display: &str, description: &str) -> ContentItem {
        ContentItem::new(
            name,
            ContentKind::Tutorial,
            json!({
                "metadata": { "name": name },
                "spec": { "displayName": display, "description": description }
            }),
        )
    }

    fn help_topic(name: &str, title: &str, content: &str) -> ContentItem {
        ContentItem::new(
            name,
            ContentKind::HelpTopic,
            json!({ "name": name, "title": title, "content": content }),
        )
    }

    async fn seeded(store: InMemoryStore) -> InMemoryStore {
        for item in [
            tutorial(
                "insights-getting-started",
                "Getting started with Insights",
                "Register systems and review recommendations",
            ),
            tutorial(
                "rhel-images",
                "Create RHEL images for deployment",
                "Build custom images with image builder",
            ),
            help_topic(
                "rbac-roles",
                "Roles",
                "A role is a set of permissions granted to groups",
            ),
        ] {
            store.create_content_item(&item).await.unwrap();
        }
        store
    }

    fn params() -> SearchParams {
        SearchParams::default()
    }

    #[tokio::test]
    async fn test_exact_name_match() {
        let store = seeded(InMemoryStore::new()).await;
        let response = FuzzyRetriever::new(&store)
            .search(&SearchParams {
                name: Some("insights-getting-started".to_string()),
                ..params()
            })
            .await
            .unwrap();

        let hit = response.result.unwrap();
        assert_eq!(hit.match_type, MatchType::ExactMatch);
        assert_eq!(hit.score, Some(0.0));
        assert_eq!(hit.item.name, "insights-getting-started");
        assert_eq!(
            hit.display_name.as_deref(),
            Some("Getting started with Insights")
        );
        assert!(!response.fallback);
        assert!(response.message.is_none());
    }

    #[tokio::test]
    async fn test_fuzzy_display_name_match() {
        let store = seeded(InMemoryStore::new()).await;
        let response = FuzzyRetriever::new(&store)
            .search(&SearchParams {
                display_name: Some("Create RHAL images".to_string()),
                max_edit_distance: 7,
                ..params()
            })
            .await
            .unwrap();

        let hit = response.result.unwrap();
        assert_eq!(hit.match_type, MatchType::FuzzyPartialMatch);
        assert_eq!(hit.item.name, "rhel-images");
    }

    #[tokio::test]
    async fn test_substring_match_on_help_topic() {
        let store = seeded(InMemoryStore::new()).await;
        let response = FuzzyRetriever::new(&store)
            .search(&SearchParams {
                description: Some("set of permissions".to_string()),
                ..params()
            })
            .await
            .unwrap();

        let hit = response.result.unwrap();
        assert_eq!(hit.match_type, MatchType::PartialMatch);
        assert_eq!(hit.item.name, "rbac-roles");
        assert_eq!(
            hit.description.as_deref(),
            Some("A role is a set of permissions granted to groups")
        );
    }

    #[tokio::test]
    async fn test_lowest_score_wins_across_fields() {
        let store = seeded(InMemoryStore::new()).await;
        // Name matches exactly; description only loosely matches another item
        let response = FuzzyRetriever::new(&store)
            .search(&SearchParams {
                name: Some("rbac-roles".to_string()),
                description: Some("custom images".to_string()),
                ..params()
            })
            .await
            .unwrap();

        let hit = response.result.unwrap();
        assert_eq!(hit.item.name, "rbac-roles");
        assert_eq!(hit.match_type, MatchType::ExactMatch);
    }

    #[tokio::test]
    async fn test_no_match_is_not_an_error() {
        let store = seeded(InMemoryStore::new()).await;
        let response = FuzzyRetriever::new(&store)
            .search(&SearchParams {
                name: Some("zzzzzzzzzzzzzzzzzzzzzzzzzz".to_string()),
                max_edit_distance: 1,
                ..params()
            })
            .await
            .unwrap();

        assert!(response.result.is_none());
        assert_eq!(response.message.as_deref(), Some(NO_MATCH));
    }

    #[tokio::test]
    async fn test_missing_query_rejected_before_store_access() {
        let store = seeded(InMemoryStore::new()).await;
        let request = SearchParams {
            name: Some("   ".to_string()),
            ..params()
        };

        let err = FuzzyRetriever::new(&store).search(&request).await.unwrap_err();
        assert!(matches!(err, CatalogError::Validation(_)));
        assert_eq!(err.to_string(), MISSING_QUERY);
        assert_eq!(store.scan_count(), 0);

        let rejected = SearchResponse::rejected(&request, &err.to_string());
        assert_eq!(
            rejected.message.as_deref(),
            Some("Error: At least one search parameter (name, displayName, or description) must be provided")
        );
    }

    #[tokio::test]
    async fn test_single_store_query_per_lookup() {
        let store = seeded(InMemoryStore::new()).await;
        FuzzyRetriever::new(&store)
            .search(&SearchParams {
                name: Some("rhel".to_string()),
                display_name: Some("images".to_string()),
                description: Some("recommendations".to_string()),
                ..params()
            })
            .await
            .unwrap();
        assert_eq!(store.scan_count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_uses_pattern_match() {
        let store = seeded(InMemoryStore::without_edit_distance()).await;
        let response = FuzzyRetriever::new(&store)
            .search(&SearchParams {
                display_name: Some("RHEL IMAGES".to_string()),
                ..params()
            })
            .await
            .unwrap();

        assert!(response.fallback);
        let hit = response.result.unwrap();
        assert_eq!(hit.match_type, MatchType::PatternMatch);
        assert_eq!(hit.score, None);
        assert_eq!(hit.item.name, "rhel-images");
        assert_eq!(store.scan_count(), 1);
    }

    #[tokio::test]
    async fn test_fallback_does_not_fuzzy_match() {
        let store = seeded(InMemoryStore::without_edit_distance()).await;
        let response = FuzzyRetriever::new(&store)
            .search(&SearchParams {
                display_name: Some("Create RHAL images".to_string()),
                ..params()
            })
            .await
            .unwrap();

        assert!(response.fallback);
        assert!(response.result.is_none());
    }

    #[tokio::test]
    async fn test_response_serializes_camel_case() {
        let store = seeded(InMemoryStore::new()).await;
        let response = FuzzyRetriever::new(&store)
            .search(&SearchParams {
                name: Some("rhel-images".to_string()),
                ..params()
            })
            .await
            .unwrap();

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["tool"], TOOL_NAME);
        assert_eq!(value["searchParams"]["name"], "rhel-images");
        assert_eq!(value["searchParams"]["maxDistance"], 7);
        assert_eq!(value["searchParams"]["limit"], 10);
        assert_eq!(value["result"]["matchType"], "exact_match");
        assert_eq!(value["result"]["displayName"], "Create RHEL images for deployment");
        assert_eq!(value["result"]["item"]["name"], "rhel-images");
        assert_eq!(value["fallback"], false);
        assert!(value.get("message").is_none());
    }
}

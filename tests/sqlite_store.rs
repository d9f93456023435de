//! Library-level tests against the SQLite store.
//!
//! These run the reconciler, lookup, favorites, and tool registry on a real
//! database file in a temporary directory, without going through the CLI.

use content_catalog::config::{Config, ContentConfig, DbConfig, RetrievalConfig};
use content_catalog::db;
use content_catalog::favorites::{list_favorites, set_favorite};
use content_catalog::matcher::{Field, MatchType, PatternQuery};
use content_catalog::migrate;
use content_catalog::models::{ContentItem, ContentKind, Favorite, Tag, TagType};
use content_catalog::reconcile::Reconciler;
use content_catalog::search::{FuzzyRetriever, SearchParams};
use content_catalog::store::sqlite::SqliteStore;
use content_catalog::store::{Association, Store};
use content_catalog::tools::{ToolContext, ToolRegistry};
use serde_json::json;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn write(path: &Path, body: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

fn config(tmp: &TempDir) -> Config {
    Config {
        db: DbConfig {
            path: tmp.path().join("data/catalog.sqlite"),
        },
        content: ContentConfig::new(tmp.path().join("docs")),
        retrieval: RetrievalConfig::default(),
    }
}

fn source_tree(root: &Path) {
    write(
        &root.join("docs/quickstarts/rhel-images/metadata.yml"),
        "kind: QuickStarts\nname: rhel-images\ntags:\n  - kind: bundle\n    value: rhel\n",
    );
    write(
        &root.join("docs/quickstarts/rhel-images/rhel-images.yml"),
        "metadata:\n  name: rhel-images\nspec:\n  displayName: Create RHEL images for deployment\n  description: Build 100% custom images\n",
    );
    write(
        &root.join("docs/help-topics/rbac/metadata.yml"),
        "kind: HelpTopic\nname: rbac\ntags:\n  - kind: bundle\n    value: settings\n  - kind: application\n    value: rbac\n",
    );
    write(
        &root.join("docs/help-topics/rbac/rbac.yml"),
        "- name: rbac-roles\n  title: Roles\n  content: Roles grant permissions\n- name: rbac-groups\n  title: Groups\n  content: Groups collect users\n- name: rbac-users\n  title: Users\n  content: Users belong to groups\n",
    );
}

async fn open(config: &Config) -> SqliteStore {
    let pool = db::connect(config).await.unwrap();
    migrate::apply(&pool).await.unwrap();
    SqliteStore::new(pool)
}

#[tokio::test]
async fn test_reconcile_into_sqlite() {
    let tmp = TempDir::new().unwrap();
    source_tree(tmp.path());
    let config = config(&tmp);
    let store = open(&config).await;

    let result = Reconciler::new(&store, &config.content).run().await.unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);
    assert_eq!(result.tutorials.created, 1);
    assert_eq!(result.help_topics.created, 3);

    let items = store.list_content_items().await.unwrap();
    assert_eq!(items.len(), 4);

    let roles = store.find_content_item("rbac-roles").await.unwrap().unwrap();
    assert_eq!(roles.kind, ContentKind::HelpTopic);
    let tags: Vec<(TagType, String)> = store
        .item_tags(&roles.id)
        .await
        .unwrap()
        .into_iter()
        .map(|t| (t.tag_type, t.value))
        .collect();
    assert_eq!(tags.len(), 3);
    assert!(tags.contains(&(TagType::Kind, "helptopic".to_string())));
    assert!(tags.contains(&(TagType::Application, "rbac".to_string())));
    assert!(tags.contains(&(TagType::Bundle, "settings".to_string())));
}

#[tokio::test]
async fn test_rebuild_preserves_favorites() {
    let tmp = TempDir::new().unwrap();
    source_tree(tmp.path());
    let config = config(&tmp);
    let store = open(&config).await;

    Reconciler::new(&store, &config.content).run().await.unwrap();
    set_favorite(&store, "acct-1", "rbac-users", true).await.unwrap();
    set_favorite(&store, "acct-1", "rhel-images", false).await.unwrap();

    let result = Reconciler::new(&store, &config.content).run().await.unwrap();
    assert!(result.is_success());
    assert_eq!(result.favorites.restored, 1);
    assert_eq!(result.favorites.skipped, 1);

    let favorites = list_favorites(&store, "acct-1").await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].content_name, "rbac-users");
    assert!(store
        .find_favorite("acct-1", "rhel-images")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_lookup_against_sqlite() {
    let tmp = TempDir::new().unwrap();
    source_tree(tmp.path());
    let config = config(&tmp);
    let store = open(&config).await;
    Reconciler::new(&store, &config.content).run().await.unwrap();

    let response = FuzzyRetriever::new(&store)
        .search(&SearchParams {
            display_name: Some("Create RHAL images".to_string()),
            ..SearchParams::default()
        })
        .await
        .unwrap();
    let hit = response.result.unwrap();
    assert_eq!(hit.match_type, MatchType::FuzzyPartialMatch);
    assert_eq!(hit.item.name, "rhel-images");
}

#[tokio::test]
async fn test_pattern_search_escapes_wildcards() {
    let tmp = TempDir::new().unwrap();
    source_tree(tmp.path());
    let config = config(&tmp);
    let store = open(&config).await.with_edit_distance(false);
    Reconciler::new(&store, &config.content).run().await.unwrap();

    let hit = store
        .pattern_search(&PatternQuery {
            conditions: vec![(Field::Description, "100%".to_string())],
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.name, "rhel-images");

    // `_` must not act as a single-character wildcard
    let miss = store
        .pattern_search(&PatternQuery {
            conditions: vec![(Field::Name, "rbac_roles".to_string())],
        })
        .await
        .unwrap();
    assert!(miss.is_none());

    let response = FuzzyRetriever::new(&store)
        .search(&SearchParams {
            display_name: Some("groups".to_string()),
            ..SearchParams::default()
        })
        .await
        .unwrap();
    assert!(response.fallback);
    assert_eq!(response.result.unwrap().item.name, "rbac-groups");
}

#[tokio::test]
async fn test_pattern_search_folds_non_ascii_case() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    let store = open(&config).await.with_edit_distance(false);

    let item = ContentItem::new(
        "etude",
        ContentKind::Tutorial,
        json!({
            "metadata": { "name": "etude" },
            "spec": { "displayName": "ÉTUDE Guide", "description": "Über die Grundlagen" }
        }),
    );
    store.create_content_item(&item).await.unwrap();

    let hit = store
        .pattern_search(&PatternQuery {
            conditions: vec![(Field::Title, "étude".to_string())],
        })
        .await
        .unwrap();
    assert_eq!(hit.unwrap().name, "etude");

    let response = FuzzyRetriever::new(&store)
        .search(&SearchParams {
            description: Some("ÜBER DIE".to_string()),
            ..SearchParams::default()
        })
        .await
        .unwrap();
    assert!(response.fallback);
    assert_eq!(response.result.unwrap().item.name, "etude");
}

#[tokio::test]
async fn test_aborted_sync_keeps_favorite_rows() {
    let tmp = TempDir::new().unwrap();
    source_tree(tmp.path());
    let mut config = config(&tmp);
    let store = open(&config).await;

    Reconciler::new(&store, &config.content).run().await.unwrap();
    set_favorite(&store, "acct-1", "rhel-images", true).await.unwrap();

    config.content = ContentConfig::new(tmp.path().join("missing"));
    assert!(Reconciler::new(&store, &config.content).run().await.is_err());

    let favorites = list_favorites(&store, "acct-1").await.unwrap();
    assert_eq!(favorites.len(), 1);
    assert_eq!(favorites[0].content_name, "rhel-images");
}

#[tokio::test]
async fn test_store_uniqueness_and_links() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    let store = open(&config).await;

    let item = ContentItem::new("a", ContentKind::Tutorial, json!({ "title": "A" }));
    store.create_content_item(&item).await.unwrap();
    assert!(store
        .create_content_item(&ContentItem::new("a", ContentKind::Tutorial, json!({})))
        .await
        .is_err());

    let tag = Tag::new(TagType::Topic, "images");
    store.create_tag(&tag).await.unwrap();
    assert!(store.create_tag(&Tag::new(TagType::Topic, "images")).await.is_err());

    store.link_tag(&tag.id, &item.id).await.unwrap();
    store.link_tag(&tag.id, &item.id).await.unwrap();
    assert_eq!(store.item_tags(&item.id).await.unwrap().len(), 1);

    store
        .clear_association(Association::TagItems(&tag.id))
        .await
        .unwrap();
    assert!(store.item_tags(&item.id).await.unwrap().is_empty());
    assert!(store.find_tag(TagType::Topic, "images").await.unwrap().is_some());
}

#[tokio::test]
async fn test_save_favorite_upserts() {
    let tmp = TempDir::new().unwrap();
    let config = config(&tmp);
    let store = open(&config).await;

    store
        .save_favorite(&Favorite::new("acct-1", "a", true))
        .await
        .unwrap();
    store
        .save_favorite(&Favorite::new("acct-1", "a", false))
        .await
        .unwrap();

    let all = store.list_favorites().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(!all[0].is_favorite);
}

#[tokio::test]
async fn test_tool_registry_over_sqlite() {
    let tmp = TempDir::new().unwrap();
    source_tree(tmp.path());
    let config = config(&tmp);
    let store = open(&config).await;
    Reconciler::new(&store, &config.content).run().await.unwrap();

    let ctx = ToolContext::new(Arc::new(config), Arc::new(store));
    let value = ToolRegistry::with_builtins()
        .execute("find_content", json!({ "name": "rbac-roles" }), &ctx)
        .await
        .unwrap();
    assert_eq!(value["result"]["matchType"], "exact_match");
    assert_eq!(value["result"]["displayName"], "Roles");
    assert_eq!(value["result"]["description"], "Roles grant permissions");
}

//! Catalog reconciliation.
//!
//! Rebuilds the whole catalog from the source tree on every run:
//!
//! 1. **Snapshot & clear**: remember all favorites, then delete every
//!    content item, tag, and item/tag link. Favorite rows are left alone.
//! 2. **Seed**: create the reserved `kind/quickstart` and `kind/helptopic` tags.
//! 3. **Discover**: scan the source tree for descriptors.
//! 4. **Reconcile**: create (or update) one item per tutorial descriptor and
//!    one per help topic entry, and link its tags.
//! 5. **Restore**: keep snapshotted favorites whose target still exists and
//!    delete the rest.
//!
//! Failures in phases 1–3 abort the run with a [`SyncError`]. Failures in
//! phases 4 and 5 are collected per item in the [`ReconciliationResult`] and
//! never stop the remaining work.
//!
//! Runs are strictly sequential and take no locks; only one sync job may
//! run against a store at a time.

use anyhow::Result;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::{Config, ContentConfig};
use crate::db;
use crate::migrate;
use crate::error::{CatalogError, ItemError, SyncError};
use crate::models::{ContentItem, ContentKind, Favorite, MetadataDescriptor, Tag, TagType};
use crate::scanner;
use crate::store::sqlite::SqliteStore;
use crate::store::{Association, Store};
use crate::tags::TagAssociationManager;

/// Per-kind item counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KindCounts {
    /// Descriptors (tutorials) or entries (help topics) attempted.
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FavoriteCounts {
    pub snapshotted: usize,
    pub restored: usize,
    /// Snapshotted with `is_favorite = false`; nothing to restore.
    pub skipped: usize,
    /// Target content item no longer exists.
    pub not_found: usize,
}

/// Outcome of one reconciliation run.
#[derive(Debug, Default)]
pub struct ReconciliationResult {
    pub items_cleared: usize,
    pub tags_cleared: usize,
    pub tutorials: KindCounts,
    pub help_topics: KindCounts,
    pub tags_created: usize,
    pub favorites: FavoriteCounts,
    pub scan_failures: usize,
    pub errors: Vec<ItemError>,
}

impl ReconciliationResult {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    fn counts_mut(&mut self, kind: ContentKind) -> &mut KindCounts {
        match kind {
            ContentKind::Tutorial => &mut self.tutorials,
            ContentKind::HelpTopic => &mut self.help_topics,
        }
    }
}

/// The reserved kind tags, seeded on every run.
struct KindTags {
    tutorial: Tag,
    help_topic: Tag,
}

impl KindTags {
    fn for_kind(&self, kind: ContentKind) -> &Tag {
        match kind {
            ContentKind::Tutorial => &self.tutorial,
            ContentKind::HelpTopic => &self.help_topic,
        }
    }
}

pub struct Reconciler<'a> {
    store: &'a dyn Store,
    content: &'a ContentConfig,
    tags: TagAssociationManager<'a>,
}

impl<'a> Reconciler<'a> {
    pub fn new(store: &'a dyn Store, content: &'a ContentConfig) -> Self {
        Self {
            store,
            content,
            tags: TagAssociationManager::new(store),
        }
    }

    /// Run all five phases.
    pub async fn run(&self) -> Result<ReconciliationResult, SyncError> {
        let mut result = ReconciliationResult::default();

        let favorites = self.snapshot_and_clear(&mut result).await?;
        info!(
            items = result.items_cleared,
            tags = result.tags_cleared,
            favorites = favorites.len(),
            "cleared catalog"
        );

        let kind_tags = self.seed_kind_tags(&mut result).await?;

        let report = scanner::scan_catalog(self.content).map_err(SyncError::Discover)?;
        result.scan_failures = report.failure_count();
        for failure in report.failures {
            result.errors.push(ItemError::new(
                failure.path.display().to_string(),
                failure.error,
            ));
        }
        info!(
            descriptors = report.descriptors.len(),
            failures = result.scan_failures,
            "discovered source content"
        );

        for descriptor in &report.descriptors {
            let outcome = match descriptor.kind {
                ContentKind::Tutorial => {
                    self.reconcile_tutorial(descriptor, &kind_tags, &mut result)
                        .await
                }
                ContentKind::HelpTopic => {
                    self.reconcile_help_topics(descriptor, &kind_tags, &mut result)
                        .await
                }
            };
            if let Err(error) = outcome {
                warn!(descriptor = %descriptor.name, %error, "failed to reconcile descriptor");
                result.errors.push(ItemError::new(descriptor.name.clone(), error));
            }
        }

        self.restore_favorites(favorites, &mut result).await;

        info!(
            tutorials = result.tutorials.processed,
            help_topics = result.help_topics.processed,
            tags_created = result.tags_created,
            favorites_restored = result.favorites.restored,
            errors = result.errors.len(),
            "reconciliation finished"
        );
        Ok(result)
    }

    // ============ Phase 1: snapshot & clear ============

    async fn snapshot_and_clear(
        &self,
        result: &mut ReconciliationResult,
    ) -> Result<Vec<Favorite>, SyncError> {
        let favorites = self.store.list_favorites().await.map_err(|e| {
            SyncError::Snapshot(CatalogError::operation("list", "favorite", "*", e))
        })?;
        let items = self.store.list_content_items().await.map_err(|e| {
            SyncError::Snapshot(CatalogError::operation("list", "content_item", "*", e))
        })?;
        let tags = self.store.list_tags().await.map_err(|e| {
            SyncError::Snapshot(CatalogError::operation("list", "tag", "*", e))
        })?;
        result.favorites.snapshotted = favorites.len();

        for item in &items {
            self.tags
                .clear_associations(Association::ItemTags(&item.id))
                .await
                .map_err(SyncError::Clear)?;
            self.store
                .delete_content_item(&item.id)
                .await
                .map_err(|e| {
                    SyncError::Clear(CatalogError::operation(
                        "delete",
                        "content_item",
                        item.name.as_str(),
                        e,
                    ))
                })?;
            result.items_cleared += 1;
        }

        for tag in &tags {
            self.tags
                .clear_associations(Association::TagItems(&tag.id))
                .await
                .map_err(SyncError::Clear)?;
            self.store.delete_tag(&tag.id).await.map_err(|e| {
                SyncError::Clear(CatalogError::operation(
                    "delete",
                    "tag",
                    format!("{}/{}", tag.tag_type, tag.value),
                    e,
                ))
            })?;
            result.tags_cleared += 1;
        }

        Ok(favorites)
    }

    // ============ Phase 2: seed default tags ============

    async fn seed_kind_tags(&self, result: &mut ReconciliationResult) -> Result<KindTags, SyncError> {
        let (tutorial, created_t) = self
            .tags
            .find_or_create(TagType::Kind, ContentKind::Tutorial.kind_tag_value())
            .await
            .map_err(SyncError::SeedTags)?;
        let (help_topic, created_h) = self
            .tags
            .find_or_create(TagType::Kind, ContentKind::HelpTopic.kind_tag_value())
            .await
            .map_err(SyncError::SeedTags)?;
        result.tags_created += usize::from(created_t) + usize::from(created_h);

        Ok(KindTags {
            tutorial,
            help_topic,
        })
    }

    // ============ Phase 4: per-descriptor reconciliation ============

    async fn reconcile_tutorial(
        &self,
        descriptor: &MetadataDescriptor,
        kind_tags: &KindTags,
        result: &mut ReconciliationResult,
    ) -> Result<(), CatalogError> {
        result.tutorials.processed += 1;

        let mut content = read_content(&descriptor.content_path)?;
        inject_tags(&mut content, descriptor)?;
        let name = content
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CatalogError::InvalidContent {
                identifier: descriptor.name.clone(),
                reason: "missing string field 'metadata.name'".to_string(),
            })?;

        let item = self
            .upsert_item(&name, ContentKind::Tutorial, content, result)
            .await?;
        self.relink_tags(&item, descriptor, kind_tags.for_kind(ContentKind::Tutorial), result)
            .await
    }

    async fn reconcile_help_topics(
        &self,
        descriptor: &MetadataDescriptor,
        kind_tags: &KindTags,
        result: &mut ReconciliationResult,
    ) -> Result<(), CatalogError> {
        let content = read_content(&descriptor.content_path)?;
        let entries = match content {
            Value::Array(entries) => entries,
            _ => {
                return Err(CatalogError::InvalidContent {
                    identifier: descriptor.name.clone(),
                    reason: "help topic file must contain a list of entries".to_string(),
                })
            }
        };

        // One bad entry fails on its own; its siblings still reconcile
        for (index, entry) in entries.into_iter().enumerate() {
            result.help_topics.processed += 1;
            let label = format!("{}[{}]", descriptor.name, index);
            if let Err(error) = self
                .reconcile_help_topic_entry(&label, entry, descriptor, kind_tags, result)
                .await
            {
                warn!(entry = %label, %error, "failed to reconcile help topic entry");
                result.errors.push(ItemError::new(label, error));
            }
        }

        Ok(())
    }

    async fn reconcile_help_topic_entry(
        &self,
        label: &str,
        entry: Value,
        descriptor: &MetadataDescriptor,
        kind_tags: &KindTags,
        result: &mut ReconciliationResult,
    ) -> Result<(), CatalogError> {
        let name = entry
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| CatalogError::InvalidContent {
                identifier: label.to_string(),
                reason: "entry is missing string field 'name'".to_string(),
            })?;

        let item = self
            .upsert_item(&name, ContentKind::HelpTopic, entry, result)
            .await?;
        self.relink_tags(&item, descriptor, kind_tags.for_kind(ContentKind::HelpTopic), result)
            .await
    }

    async fn upsert_item(
        &self,
        name: &str,
        kind: ContentKind,
        content: Value,
        result: &mut ReconciliationResult,
    ) -> Result<ContentItem, CatalogError> {
        let existing = self
            .store
            .find_content_item(name)
            .await
            .map_err(|e| CatalogError::operation("find", "content_item", name, e))?;

        match existing {
            Some(mut item) => {
                item.content = content;
                item.updated_at = chrono::Utc::now().timestamp();
                self.store
                    .update_content_item(&item)
                    .await
                    .map_err(|e| CatalogError::operation("update", "content_item", name, e))?;
                result.counts_mut(kind).updated += 1;
                debug!(name, %kind, "updated content item");
                Ok(item)
            }
            None => {
                let item = ContentItem::new(name, kind, content);
                self.store
                    .create_content_item(&item)
                    .await
                    .map_err(|e| CatalogError::operation("create", "content_item", name, e))?;
                result.counts_mut(kind).created += 1;
                debug!(name, %kind, "created content item");
                Ok(item)
            }
        }
    }

    /// Replace the item's tag links with the declared tags plus its kind tag.
    async fn relink_tags(
        &self,
        item: &ContentItem,
        descriptor: &MetadataDescriptor,
        kind_tag: &Tag,
        result: &mut ReconciliationResult,
    ) -> Result<(), CatalogError> {
        self.tags
            .clear_associations(Association::ItemTags(&item.id))
            .await?;

        for declared in &descriptor.tags {
            let (tag, created) = self
                .tags
                .find_or_create(declared.kind, &declared.value)
                .await?;
            if created {
                result.tags_created += 1;
            }
            self.tags.link(&tag, item).await?;
        }

        self.tags.link(kind_tag, item).await
    }

    // ============ Phase 5: restore favorites ============

    /// Favorite rows survive phases 1 to 4 untouched. Here the unmarked ones
    /// and those whose target is gone are deleted; the rest stay as they are.
    async fn restore_favorites(&self, favorites: Vec<Favorite>, result: &mut ReconciliationResult) {
        for favorite in favorites {
            let label = format!("favorite {}:{}", favorite.account_id, favorite.content_name);

            if !favorite.is_favorite {
                result.favorites.skipped += 1;
                self.drop_favorite(&favorite, &label, result).await;
                continue;
            }

            match self.store.find_content_item(&favorite.content_name).await {
                Ok(Some(_)) => result.favorites.restored += 1,
                Ok(None) => {
                    warn!(
                        account = %favorite.account_id,
                        content = %favorite.content_name,
                        "favorite target no longer exists, dropping"
                    );
                    result.favorites.not_found += 1;
                    self.drop_favorite(&favorite, &label, result).await;
                }
                Err(e) => result.errors.push(ItemError::new(
                    label,
                    CatalogError::operation("find", "content_item", favorite.content_name.as_str(), e),
                )),
            }
        }
    }

    async fn drop_favorite(&self, favorite: &Favorite, label: &str, result: &mut ReconciliationResult) {
        if let Err(e) = self
            .store
            .delete_favorite(&favorite.account_id, &favorite.content_name)
            .await
        {
            result.errors.push(ItemError::new(
                label,
                CatalogError::operation("delete", "favorite", favorite.content_name.as_str(), e),
            ));
        }
    }
}

/// Read a companion YAML file as a JSON value.
fn read_content(path: &Path) -> Result<Value, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&text).map_err(|source| CatalogError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}

/// Write the descriptor's tags into `metadata.tags` so the stored record
/// describes its own classification.
fn inject_tags(content: &mut Value, descriptor: &MetadataDescriptor) -> Result<(), CatalogError> {
    let root = content
        .as_object_mut()
        .ok_or_else(|| CatalogError::InvalidContent {
            identifier: descriptor.name.clone(),
            reason: "tutorial file must contain a mapping".to_string(),
        })?;

    let metadata = root
        .entry("metadata")
        .or_insert_with(|| json!({}))
        .as_object_mut()
        .ok_or_else(|| CatalogError::InvalidContent {
            identifier: descriptor.name.clone(),
            reason: "'metadata' must be a mapping".to_string(),
        })?;

    let tags: Vec<Value> = descriptor
        .tags
        .iter()
        .map(|t| json!({ "kind": t.kind.as_str(), "value": t.value }))
        .collect();
    metadata.insert("tags".to_string(), Value::Array(tags));

    Ok(())
}

/// CLI entry point: connect, reconcile, and print a summary.
///
/// Returns an error when the run aborted or finished with per-item errors.
pub async fn run_sync(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    migrate::apply(&pool).await?;
    let store = SqliteStore::new(pool.clone());

    let outcome = Reconciler::new(&store, &config.content).run().await;
    pool.close().await;
    let result = outcome?;

    println!("sync");
    println!(
        "  cleared: {} items, {} tags",
        result.items_cleared, result.tags_cleared
    );
    println!(
        "  tutorials: {} processed, {} created, {} updated",
        result.tutorials.processed, result.tutorials.created, result.tutorials.updated
    );
    println!(
        "  help topics: {} processed, {} created, {} updated",
        result.help_topics.processed, result.help_topics.created, result.help_topics.updated
    );
    println!("  tags created: {}", result.tags_created);
    println!(
        "  favorites: {} restored, {} skipped, {} not found",
        result.favorites.restored, result.favorites.skipped, result.favorites.not_found
    );
    println!("  scan failures: {}", result.scan_failures);

    if !result.is_success() {
        println!("  errors: {}", result.errors.len());
        for error in &result.errors {
            println!("    - {}", error);
        }
        anyhow::bail!(
            "reconciliation finished with {} error(s)",
            result.errors.len()
        );
    }

    println!("ok");
    Ok(())
}

//! In-memory [`Store`] implementation for testing.
//!
//! Uses `Vec`s behind `std::sync::RwLock` so iteration follows insertion
//! order, like a table scan. Uniqueness rules match the SQLite schema.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::matcher::PatternQuery;
use crate::models::{ContentItem, Favorite, Tag, TagType};

use super::{Association, Store};

/// In-memory store for tests.
pub struct InMemoryStore {
    items: RwLock<Vec<ContentItem>>,
    tags: RwLock<Vec<Tag>>,
    links: RwLock<Vec<(String, String)>>, // (item_id, tag_id)
    favorites: RwLock<Vec<Favorite>>,
    edit_distance: bool,
    failing_names: RwLock<HashSet<String>>,
    scans: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            items: RwLock::new(Vec::new()),
            tags: RwLock::new(Vec::new()),
            links: RwLock::new(Vec::new()),
            favorites: RwLock::new(Vec::new()),
            edit_distance: true,
            failing_names: RwLock::new(HashSet::new()),
            scans: AtomicUsize::new(0),
        }
    }

    /// A store whose lookups must fall back to pattern matching.
    pub fn without_edit_distance() -> Self {
        Self {
            edit_distance: false,
            ..Self::new()
        }
    }

    /// Make every create/update of the item called `name` fail.
    pub fn fail_writes_for(&self, name: &str) {
        self.failing_names.write().unwrap().insert(name.to_string());
    }

    /// Number of full scans (`list_content_items` or `pattern_search`) served.
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::SeqCst)
    }

    fn check_writable(&self, name: &str) -> Result<()> {
        if self.failing_names.read().unwrap().contains(name) {
            bail!("simulated write failure for '{}'", name);
        }
        Ok(())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_content_items(&self) -> Result<Vec<ContentItem>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.read().unwrap().clone())
    }

    async fn find_content_item(&self, name: &str) -> Result<Option<ContentItem>> {
        let items = self.items.read().unwrap();
        Ok(items.iter().find(|i| i.name == name).cloned())
    }

    async fn create_content_item(&self, item: &ContentItem) -> Result<()> {
        self.check_writable(&item.name)?;
        let mut items = self.items.write().unwrap();
        if items.iter().any(|i| i.name == item.name) {
            bail!("UNIQUE constraint failed: content_items.name");
        }
        items.push(item.clone());
        Ok(())
    }

    async fn update_content_item(&self, item: &ContentItem) -> Result<()> {
        self.check_writable(&item.name)?;
        let mut items = self.items.write().unwrap();
        match items.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => {
                existing.content = item.content.clone();
                existing.updated_at = item.updated_at;
                Ok(())
            }
            None => bail!("content item not found: {}", item.id),
        }
    }

    async fn delete_content_item(&self, id: &str) -> Result<()> {
        self.items.write().unwrap().retain(|i| i.id != id);
        Ok(())
    }

    async fn list_tags(&self) -> Result<Vec<Tag>> {
        Ok(self.tags.read().unwrap().clone())
    }

    async fn find_tag(&self, tag_type: TagType, value: &str) -> Result<Option<Tag>> {
        let tags = self.tags.read().unwrap();
        Ok(tags
            .iter()
            .find(|t| t.tag_type == tag_type && t.value == value)
            .cloned())
    }

    async fn create_tag(&self, tag: &Tag) -> Result<()> {
        let mut tags = self.tags.write().unwrap();
        if tags
            .iter()
            .any(|t| t.tag_type == tag.tag_type && t.value == tag.value)
        {
            bail!("UNIQUE constraint failed: tags.tag_type, tags.value");
        }
        tags.push(tag.clone());
        Ok(())
    }

    async fn delete_tag(&self, id: &str) -> Result<()> {
        self.tags.write().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    async fn link_tag(&self, tag_id: &str, item_id: &str) -> Result<()> {
        let mut links = self.links.write().unwrap();
        if !links.iter().any(|(i, t)| i == item_id && t == tag_id) {
            links.push((item_id.to_string(), tag_id.to_string()));
        }
        Ok(())
    }

    async fn clear_association(&self, association: Association<'_>) -> Result<()> {
        let mut links = self.links.write().unwrap();
        match association {
            Association::ItemTags(item_id) => links.retain(|(i, _)| i != item_id),
            Association::TagItems(tag_id) => links.retain(|(_, t)| t != tag_id),
        }
        Ok(())
    }

    async fn item_tags(&self, item_id: &str) -> Result<Vec<Tag>> {
        let links = self.links.read().unwrap();
        let tags = self.tags.read().unwrap();
        Ok(tags
            .iter()
            .filter(|t| links.iter().any(|(i, tid)| i == item_id && tid == &t.id))
            .cloned()
            .collect())
    }

    async fn list_favorites(&self) -> Result<Vec<Favorite>> {
        Ok(self.favorites.read().unwrap().clone())
    }

    async fn find_favorite(
        &self,
        account_id: &str,
        content_name: &str,
    ) -> Result<Option<Favorite>> {
        let favorites = self.favorites.read().unwrap();
        Ok(favorites
            .iter()
            .find(|f| f.account_id == account_id && f.content_name == content_name)
            .cloned())
    }

    async fn save_favorite(&self, favorite: &Favorite) -> Result<()> {
        let mut favorites = self.favorites.write().unwrap();
        match favorites.iter_mut().find(|f| {
            f.account_id == favorite.account_id && f.content_name == favorite.content_name
        }) {
            Some(existing) => {
                existing.is_favorite = favorite.is_favorite;
                existing.updated_at = favorite.updated_at;
            }
            None => favorites.push(favorite.clone()),
        }
        Ok(())
    }

    async fn delete_favorite(&self, account_id: &str, content_name: &str) -> Result<()> {
        self.favorites
            .write()
            .unwrap()
            .retain(|f| !(f.account_id == account_id && f.content_name == content_name));
        Ok(())
    }

    async fn pattern_search(&self, query: &PatternQuery) -> Result<Option<ContentItem>> {
        self.scans.fetch_add(1, Ordering::SeqCst);
        let items = self.items.read().unwrap();
        Ok(items.iter().find(|i| query.matches(i)).cloned())
    }

    fn edit_distance_available(&self) -> bool {
        self.edit_distance
    }
}

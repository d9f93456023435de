//! Storage abstraction for the catalog.
//!
//! The [`Store`] trait is everything the sync and lookup engines need
//! from persistence: plain create/find/update/delete on content items,
//! tags, and favorites, plus the many-to-many links between items and
//! tags. Two backends ship with the crate:
//!
//! | Backend | Module | Use |
//! |---------|--------|-----|
//! | [`SqliteStore`](sqlite::SqliteStore) | [`sqlite`] | Production (sqlx, WAL) |
//! | [`InMemoryStore`](memory::InMemoryStore) | [`memory`] | Tests |
//!
//! Implementations must be `Send + Sync` to work with async runtimes.
//! Transactions and connection handling stay inside each backend.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::matcher::PatternQuery;
use crate::models::{ContentItem, Favorite, Tag, TagType};

/// One side of the item/tag many-to-many relation.
///
/// Clearing an association removes the links only; neither the entity
/// nor the rows on the other side are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Association<'a> {
    /// The `tags` relation of a content item.
    ItemTags(&'a str),
    /// The `content_items` relation of a tag.
    TagItems(&'a str),
}

impl Association<'_> {
    pub fn relation_name(&self) -> &'static str {
        match self {
            Association::ItemTags(_) => "tags",
            Association::TagItems(_) => "content_items",
        }
    }

    pub fn entity(&self) -> &'static str {
        match self {
            Association::ItemTags(_) => "content_item",
            Association::TagItems(_) => "tag",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Association::ItemTags(id) | Association::TagItems(id) => id,
        }
    }
}

/// Abstract persistence backend.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_content_items`](Store::list_content_items) | Full scan of content items, in store order |
/// | [`find_content_item`](Store::find_content_item) | Lookup by unique name |
/// | [`create_content_item`](Store::create_content_item) / [`update_content_item`](Store::update_content_item) | Write an item |
/// | [`delete_content_item`](Store::delete_content_item) | Hard delete by id |
/// | [`list_tags`](Store::list_tags) / [`find_tag`](Store::find_tag) / [`create_tag`](Store::create_tag) / [`delete_tag`](Store::delete_tag) | Tag rows |
/// | [`link_tag`](Store::link_tag) / [`clear_association`](Store::clear_association) / [`item_tags`](Store::item_tags) | Item/tag links |
/// | [`list_favorites`](Store::list_favorites) / [`find_favorite`](Store::find_favorite) / [`save_favorite`](Store::save_favorite) / [`delete_favorite`](Store::delete_favorite) | Favorites |
/// | [`pattern_search`](Store::pattern_search) | Containment lookup used when edit distance is unavailable |
#[async_trait]
pub trait Store: Send + Sync {
    async fn list_content_items(&self) -> Result<Vec<ContentItem>>;

    async fn find_content_item(&self, name: &str) -> Result<Option<ContentItem>>;

    async fn create_content_item(&self, item: &ContentItem) -> Result<()>;

    /// Overwrite content and `updated_at` of the item with `item.id`.
    async fn update_content_item(&self, item: &ContentItem) -> Result<()>;

    async fn delete_content_item(&self, id: &str) -> Result<()>;

    async fn list_tags(&self) -> Result<Vec<Tag>>;

    async fn find_tag(&self, tag_type: TagType, value: &str) -> Result<Option<Tag>>;

    async fn create_tag(&self, tag: &Tag) -> Result<()>;

    async fn delete_tag(&self, id: &str) -> Result<()>;

    /// Link a tag to an item. Linking an already-linked pair is a no-op.
    async fn link_tag(&self, tag_id: &str, item_id: &str) -> Result<()>;

    async fn clear_association(&self, association: Association<'_>) -> Result<()>;

    async fn item_tags(&self, item_id: &str) -> Result<Vec<Tag>>;

    async fn list_favorites(&self) -> Result<Vec<Favorite>>;

    async fn find_favorite(&self, account_id: &str, content_name: &str)
        -> Result<Option<Favorite>>;

    /// Insert a favorite, or update `is_favorite` of the existing
    /// `(account_id, content_name)` row.
    async fn save_favorite(&self, favorite: &Favorite) -> Result<()>;

    /// Delete the `(account_id, content_name)` row, if any.
    async fn delete_favorite(&self, account_id: &str, content_name: &str) -> Result<()>;

    /// First item (in store order) matching any condition of `query`.
    async fn pattern_search(&self, query: &PatternQuery) -> Result<Option<ContentItem>>;

    /// Whether lookups may use edit-distance scoring against this store.
    fn edit_distance_available(&self) -> bool {
        true
    }
}

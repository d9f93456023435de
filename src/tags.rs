//! Tag rows and their links to content items.
//!
//! Every operation maps store failures into
//! [`CatalogError::Operation`] with the operation, entity, and identifier,
//! so a caller can log the failure and carry on with the next item.

use tracing::debug;

use crate::error::CatalogError;
use crate::models::{ContentItem, Tag, TagType};
use crate::store::{Association, Store};

pub struct TagAssociationManager<'a> {
    store: &'a dyn Store,
}

impl<'a> TagAssociationManager<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Look a tag up by `(tag_type, value)`, creating it when absent.
    ///
    /// Returns the tag and whether it was created by this call.
    pub async fn find_or_create(
        &self,
        tag_type: TagType,
        value: &str,
    ) -> Result<(Tag, bool), CatalogError> {
        let identifier = format!("{}/{}", tag_type, value);

        let existing = self
            .store
            .find_tag(tag_type, value)
            .await
            .map_err(|e| CatalogError::operation("find", "tag", identifier.as_str(), e))?;
        if let Some(tag) = existing {
            return Ok((tag, false));
        }

        let tag = Tag::new(tag_type, value);
        self.store
            .create_tag(&tag)
            .await
            .map_err(|e| CatalogError::operation("create", "tag", identifier.as_str(), e))?;
        debug!(tag = %identifier, "created tag");
        Ok((tag, true))
    }

    /// Remove every link of one relation without touching either side.
    pub async fn clear_associations(&self, association: Association<'_>) -> Result<(), CatalogError> {
        self.store
            .clear_association(association)
            .await
            .map_err(|e| {
                CatalogError::operation(
                    "clear_associations",
                    association.entity(),
                    format!("{}.{}", association.id(), association.relation_name()),
                    e,
                )
            })
    }

    /// Link `tag` to `item`. Already-linked pairs are left as they are.
    pub async fn link(&self, tag: &Tag, item: &ContentItem) -> Result<(), CatalogError> {
        self.store.link_tag(&tag.id, &item.id).await.map_err(|e| {
            CatalogError::operation(
                "link",
                "content_item",
                format!("{} <- {}/{}", item.name, tag.tag_type, tag.value),
                e,
            )
        })
    }
}

//! Per-account favorites.
//!
//! Favorites reference content by name, so they outlive the item ids that
//! every sync regenerates. Marking an item that does not exist is refused;
//! unmarking keeps the row with `is_favorite = false`.

use anyhow::Result;
use tracing::debug;

use crate::config::Config;
use crate::db;
use crate::error::CatalogError;
use crate::models::Favorite;
use crate::store::sqlite::SqliteStore;
use crate::store::Store;

/// Mark or unmark `content_name` as a favorite of `account_id`.
pub async fn set_favorite(
    store: &dyn Store,
    account_id: &str,
    content_name: &str,
    is_favorite: bool,
) -> Result<Favorite, CatalogError> {
    let identifier = format!("{}:{}", account_id, content_name);

    if account_id.trim().is_empty() {
        return Err(CatalogError::Validation(
            "account id must not be empty".to_string(),
        ));
    }

    let target = store
        .find_content_item(content_name)
        .await
        .map_err(|e| CatalogError::operation("find", "content_item", content_name, e))?;
    if target.is_none() {
        return Err(CatalogError::Validation(format!(
            "content item not found: {}",
            content_name
        )));
    }

    let existing = store
        .find_favorite(account_id, content_name)
        .await
        .map_err(|e| CatalogError::operation("find", "favorite", identifier.as_str(), e))?;

    let favorite = match existing {
        Some(mut favorite) => {
            favorite.is_favorite = is_favorite;
            favorite.updated_at = chrono::Utc::now().timestamp();
            favorite
        }
        None => Favorite::new(account_id, content_name, is_favorite),
    };

    store
        .save_favorite(&favorite)
        .await
        .map_err(|e| CatalogError::operation("save", "favorite", identifier.as_str(), e))?;
    debug!(favorite = %identifier, is_favorite, "saved favorite");

    Ok(favorite)
}

/// Favorites of one account that are currently marked.
pub async fn list_favorites(store: &dyn Store, account_id: &str) -> Result<Vec<Favorite>, CatalogError> {
    let favorites = store
        .list_favorites()
        .await
        .map_err(|e| CatalogError::operation("list", "favorite", account_id, e))?;

    Ok(favorites
        .into_iter()
        .filter(|f| f.account_id == account_id && f.is_favorite)
        .collect())
}

pub async fn run_set_favorite(
    config: &Config,
    account_id: &str,
    content_name: &str,
    is_favorite: bool,
) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let outcome = set_favorite(&store, account_id, content_name, is_favorite).await;
    pool.close().await;

    let favorite = outcome?;
    println!(
        "{} {} for {}",
        if favorite.is_favorite { "favorited" } else { "unfavorited" },
        favorite.content_name,
        favorite.account_id
    );
    Ok(())
}

pub async fn run_list_favorites(config: &Config, account_id: &str) -> Result<()> {
    let pool = db::connect(config).await?;
    let store = SqliteStore::new(pool.clone());
    let outcome = list_favorites(&store, account_id).await;
    pool.close().await;

    let favorites = outcome?;
    if favorites.is_empty() {
        println!("No favorites.");
        return Ok(());
    }
    for favorite in favorites {
        println!("{}", favorite.content_name);
    }
    Ok(())
}

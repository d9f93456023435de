//! Error taxonomy for the catalog engines.
//!
//! - [`CatalogError`] describes a single failed operation and carries enough
//!   context (operation, entity, identifier) to log and replay it by hand.
//! - [`ItemError`] is a per-item failure collected during a sync run.
//! - [`SyncError`] is a systemic failure that aborts the run.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{operation} {entity} '{identifier}' failed: {source}")]
    Operation {
        operation: &'static str,
        entity: &'static str,
        identifier: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid descriptor {}: {reason}", path.display())]
    InvalidDescriptor { path: PathBuf, reason: String },

    #[error("invalid content for '{identifier}': {reason}")]
    InvalidContent { identifier: String, reason: String },

    #[error("{0}")]
    Validation(String),
}

impl CatalogError {
    pub fn operation(
        operation: &'static str,
        entity: &'static str,
        identifier: impl Into<String>,
        source: anyhow::Error,
    ) -> Self {
        CatalogError::Operation {
            operation,
            entity,
            identifier: identifier.into(),
            source,
        }
    }
}

/// A failure scoped to one descriptor (or one favorite) during a sync run.
#[derive(Error, Debug)]
#[error("{descriptor}: {error}")]
pub struct ItemError {
    pub descriptor: String,
    #[source]
    pub error: CatalogError,
}

impl ItemError {
    pub fn new(descriptor: impl Into<String>, error: CatalogError) -> Self {
        Self {
            descriptor: descriptor.into(),
            error,
        }
    }
}

/// A failure that aborts the whole sync run.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("snapshot of existing catalog failed: {0}")]
    Snapshot(#[source] CatalogError),

    #[error("clearing existing catalog failed: {0}")]
    Clear(#[source] CatalogError),

    #[error("seeding default tags failed: {0}")]
    SeedTags(#[source] CatalogError),

    #[error("discovering source content failed: {0}")]
    Discover(#[source] anyhow::Error),
}

//! TOML configuration parsing and validation.
//!
//! A single file (default `./config/catalog.toml`) describes where the
//! SQLite database lives, where the content source tree is, and how the
//! fuzzy lookup behaves.
//!
//! ```toml
//! [db]
//! path = "./data/catalog.sqlite"
//!
//! [content]
//! root = "./docs"
//!
//! [retrieval]
//! max_edit_distance = 7
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub content: ContentConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

/// Layout of the content source tree.
#[derive(Debug, Deserialize, Clone)]
pub struct ContentConfig {
    pub root: PathBuf,
    /// Subtree holding tutorial descriptors, relative to `root`.
    #[serde(default = "default_tutorials_dir")]
    pub tutorials_dir: PathBuf,
    /// Subtree holding help topic descriptors, relative to `root`.
    #[serde(default = "default_help_topics_dir")]
    pub help_topics_dir: PathBuf,
    /// Globs (relative to each subtree) that identify descriptor files.
    #[serde(default = "default_descriptor_globs")]
    pub descriptor_globs: Vec<String>,
}

fn default_tutorials_dir() -> PathBuf {
    PathBuf::from("quickstarts")
}
fn default_help_topics_dir() -> PathBuf {
    PathBuf::from("help-topics")
}
fn default_descriptor_globs() -> Vec<String> {
    vec![
        "**/metadata.yml".to_string(),
        "**/metadata.yaml".to_string(),
    ]
}

impl ContentConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tutorials_dir: default_tutorials_dir(),
            help_topics_dir: default_help_topics_dir(),
            descriptor_globs: default_descriptor_globs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_max_edit_distance")]
    pub max_edit_distance: usize,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// When false the store reports no edit-distance support and lookups
    /// use plain pattern matching.
    #[serde(default = "default_edit_distance")]
    pub edit_distance: bool,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_edit_distance: default_max_edit_distance(),
            limit: default_limit(),
            edit_distance: default_edit_distance(),
        }
    }
}

fn default_max_edit_distance() -> usize {
    7
}
fn default_limit() -> usize {
    10
}
fn default_edit_distance() -> bool {
    true
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;

    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.retrieval.limit < 1 {
        anyhow::bail!("retrieval.limit must be >= 1");
    }

    if config.content.descriptor_globs.is_empty() {
        anyhow::bail!("content.descriptor_globs must contain at least one pattern");
    }

    if config.content.tutorials_dir == config.content.help_topics_dir {
        anyhow::bail!(
            "content.tutorials_dir and content.help_topics_dir must differ (both are '{}')",
            config.content.tutorials_dir.display()
        );
    }

    Ok(())
}

//! Core data models used throughout the catalog.
//!
//! These types represent the content items, tags, and favorites persisted
//! in the store, plus the descriptors the scanner reads from the source
//! tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Structural kind of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentKind {
    Tutorial,
    HelpTopic,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Tutorial => "tutorial",
            ContentKind::HelpTopic => "helptopic",
        }
    }

    /// Value of the reserved `kind` tag attached to every item of this kind.
    pub fn kind_tag_value(&self) -> &'static str {
        match self {
            ContentKind::Tutorial => "quickstart",
            ContentKind::HelpTopic => "helptopic",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "quickstarts" | "quickstart" | "tutorial" => Ok(ContentKind::Tutorial),
            "helptopic" | "helptopics" | "help-topic" => Ok(ContentKind::HelpTopic),
            other => Err(format!("unknown content kind: '{}'", other)),
        }
    }
}

/// Closed set of tag classifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagType {
    Bundle,
    Application,
    Kind,
    Topic,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::Bundle => "bundle",
            TagType::Application => "application",
            TagType::Kind => "kind",
            TagType::Topic => "topic",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TagType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bundle" => Ok(TagType::Bundle),
            "application" => Ok(TagType::Application),
            "kind" => Ok(TagType::Kind),
            "topic" => Ok(TagType::Topic),
            other => Err(format!("unknown tag type: '{}'", other)),
        }
    }
}

/// A `(type, value)` classification label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub id: String,
    pub tag_type: TagType,
    pub value: String,
}

impl Tag {
    pub fn new(tag_type: TagType, value: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            tag_type,
            value: value.into(),
        }
    }
}

/// A persisted tutorial or help topic.
///
/// `name` is the stable identity; `id` is regenerated on every rebuild.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentItem {
    pub id: String,
    pub name: String,
    pub kind: ContentKind,
    pub content: Value,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ContentItem {
    pub fn new(name: impl Into<String>, kind: ContentKind, content: Value) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Display name: `spec.displayName` for tutorials, `title` for help topics.
    pub fn display_name(&self) -> Option<&str> {
        display_name_of(&self.content)
    }

    /// Description: `spec.description` for tutorials, `content` for help topics.
    pub fn description(&self) -> Option<&str> {
        description_of(&self.content)
    }
}

pub(crate) fn display_name_of(content: &Value) -> Option<&str> {
    content
        .pointer("/spec/displayName")
        .or_else(|| content.get("title"))
        .and_then(Value::as_str)
}

pub(crate) fn description_of(content: &Value) -> Option<&str> {
    content
        .pointer("/spec/description")
        .or_else(|| content.get("content"))
        .and_then(Value::as_str)
}

/// Per-account preference referencing a content item by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Favorite {
    pub id: String,
    pub account_id: String,
    pub content_name: String,
    pub is_favorite: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Favorite {
    pub fn new(
        account_id: impl Into<String>,
        content_name: impl Into<String>,
        is_favorite: bool,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            account_id: account_id.into(),
            content_name: content_name.into(),
            is_favorite,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A declared tag on a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DescriptorTag {
    pub kind: TagType,
    pub value: String,
}

/// Parsed descriptor file. Lives only for the duration of a sync run.
#[derive(Debug, Clone)]
pub struct MetadataDescriptor {
    pub kind: ContentKind,
    pub name: String,
    pub tags: Vec<DescriptorTag>,
    pub content_path: PathBuf,
    pub descriptor_path: PathBuf,
}

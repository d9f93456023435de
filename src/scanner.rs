//! Source tree scanner.
//!
//! Walks the tutorial and help topic subtrees, parses every descriptor
//! file, and resolves the companion content file next to it. Individual
//! descriptors that cannot be read or parsed are reported as failures
//! alongside the descriptors that did parse; only a missing root or a
//! traversal error aborts the scan.

use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::ContentConfig;
use crate::error::CatalogError;
use crate::models::{ContentKind, DescriptorTag, MetadataDescriptor, TagType};

/// Outcome of a scan: everything that parsed, plus what didn't.
#[derive(Debug, Default)]
pub struct ScanReport {
    pub descriptors: Vec<MetadataDescriptor>,
    pub failures: Vec<ScanFailure>,
}

impl ScanReport {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

#[derive(Debug)]
pub struct ScanFailure {
    pub path: PathBuf,
    pub error: CatalogError,
}

#[derive(Debug, Deserialize)]
struct RawDescriptor {
    kind: Option<String>,
    name: Option<String>,
    #[serde(default)]
    tags: Vec<RawTag>,
}

#[derive(Debug, Deserialize)]
struct RawTag {
    kind: String,
    value: String,
}

pub fn scan_catalog(config: &ContentConfig) -> Result<ScanReport> {
    let root = &config.root;
    if !root.is_dir() {
        bail!("Content root does not exist: {}", root.display());
    }

    let descriptor_set = build_globset(&config.descriptor_globs)?;
    let mut report = ScanReport::default();

    for subtree in [&config.tutorials_dir, &config.help_topics_dir] {
        let dir = root.join(subtree);
        if !dir.is_dir() {
            warn!(path = %dir.display(), "content subtree missing, skipping");
            continue;
        }

        for entry in WalkDir::new(&dir) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(&dir).unwrap_or(path);
            if !descriptor_set.is_match(relative) {
                continue;
            }

            match read_descriptor(path) {
                Ok(descriptor) => {
                    debug!(
                        name = %descriptor.name,
                        kind = %descriptor.kind,
                        "found descriptor"
                    );
                    report.descriptors.push(descriptor);
                }
                Err(error) => {
                    warn!(path = %path.display(), %error, "unreadable descriptor");
                    report.failures.push(ScanFailure {
                        path: path.to_path_buf(),
                        error,
                    });
                }
            }
        }
    }

    // Sort for deterministic ordering
    report
        .descriptors
        .sort_by(|a, b| a.descriptor_path.cmp(&b.descriptor_path));

    Ok(report)
}

/// Parse one descriptor file and resolve its companion content path.
pub fn read_descriptor(path: &Path) -> Result<MetadataDescriptor, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let raw: RawDescriptor = serde_yaml::from_str(&text).map_err(|source| CatalogError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;

    let invalid = |reason: String| CatalogError::InvalidDescriptor {
        path: path.to_path_buf(),
        reason,
    };

    let kind = raw
        .kind
        .ok_or_else(|| invalid("missing field 'kind'".to_string()))?
        .parse::<ContentKind>()
        .map_err(invalid)?;

    let name = raw
        .name
        .filter(|n| !n.trim().is_empty())
        .ok_or_else(|| invalid("missing field 'name'".to_string()))?;
    // The companion file must sit next to the descriptor
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(invalid(format!("name '{}' must be a plain file stem", name)));
    }

    let tags = raw
        .tags
        .into_iter()
        .map(|t| -> Result<DescriptorTag, String> {
            Ok(DescriptorTag {
                kind: t.kind.parse::<TagType>()?,
                value: t.value,
            })
        })
        .collect::<Result<Vec<_>, String>>()
        .map_err(invalid)?;

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let content_path = resolve_content_path(dir, &name);

    Ok(MetadataDescriptor {
        kind,
        name,
        tags,
        content_path,
        descriptor_path: path.to_path_buf(),
    })
}

/// `<name>.yml` when it exists, otherwise `<name>.yaml`.
fn resolve_content_path(dir: &Path, name: &str) -> PathBuf {
    let yml = dir.join(format!("{}.yml", name));
    if yml.is_file() {
        yml
    } else {
        dir.join(format!("{}.yaml", name))
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

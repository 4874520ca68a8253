//! Descriptor files that make up a tagging project on disk.
//!
//! A project tree holds exactly one project descriptor (`<name>.tagproj`)
//! and one item descriptor per tagged unit (`<identifier>-item.json`).
//! Classification is by filename convention only; anything else in the tree
//! is not a descriptor and is left alone.

pub mod descriptor;
pub mod item;

use std::fs;
use std::path::Path;

use thiserror::Error;

pub use descriptor::{Connection, EncryptedOptions, ProjectDescriptor, TagDefinition};
pub use item::{ItemDescriptor, ItemSummary, item_identifier, resolved_item_path};

/// Extension of the single top-level project descriptor.
pub const PROJECT_EXTENSION: &str = "tagproj";

/// Filename suffix of per-item descriptors.
pub const ITEM_FILE_SUFFIX: &str = "-item.json";

/// A descriptor file, polymorphic over the two on-disk variants.
#[derive(Debug, Clone)]
pub enum Descriptor {
    Project(ProjectDescriptor),
    Item(ItemDescriptor),
}

impl Descriptor {
    /// The filename this descriptor should have on disk after relocation.
    pub fn file_name(&self) -> String {
        match self {
            Descriptor::Project(project) => {
                format!("{}.{PROJECT_EXTENSION}", project.name)
            }
            Descriptor::Item(item) => format!("{}{ITEM_FILE_SUFFIX}", item.item.id),
        }
    }

    /// Stable 2-space-indented JSON with a trailing newline.
    pub fn to_pretty_json(&self) -> serde_json::Result<Vec<u8>> {
        let mut buf = match self {
            Descriptor::Project(project) => serde_json::to_vec_pretty(project)?,
            Descriptor::Item(item) => serde_json::to_vec_pretty(item)?,
        };
        buf.push(b'\n');
        Ok(buf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorKind {
    Project,
    Item,
}

/// Classify a filename, or `None` when it is hidden or matches neither
/// descriptor convention.
pub fn classify(file_name: &str) -> Option<DescriptorKind> {
    if file_name.starts_with('.') {
        return None;
    }
    if file_name.ends_with(ITEM_FILE_SUFFIX) {
        return Some(DescriptorKind::Item);
    }
    if Path::new(file_name).extension().is_some_and(|ext| ext == PROJECT_EXTENSION) {
        return Some(DescriptorKind::Project);
    }
    None
}

/// A descriptor candidate that could not be read or parsed. Skippable:
/// the walk logs it and moves on.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Load and parse a classified descriptor file.
pub fn load(path: &Path, kind: DescriptorKind) -> Result<Descriptor, LoadError> {
    let raw = fs::read(path)?;
    Ok(match kind {
        DescriptorKind::Project => Descriptor::Project(serde_json::from_slice(&raw)?),
        DescriptorKind::Item => Descriptor::Item(serde_json::from_slice(&raw)?),
    })
}

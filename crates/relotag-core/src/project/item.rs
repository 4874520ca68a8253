//! Per-item descriptors and content-addressed identifiers.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Summary of one tagged item, embedded both in its own descriptor and in
/// the project's item index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSummary {
    pub format: String,
    pub id: String,
    pub name: String,
    pub path: String,
    pub size: ItemSize,
    pub state: i64,
    #[serde(rename = "type")]
    pub kind: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSize {
    pub width: i64,
    pub height: i64,
}

/// A per-item descriptor file. Regions are opaque payload, copied through
/// unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub item: ItemSummary,
    #[serde(default)]
    pub regions: Vec<Value>,
    pub version: String,
}

/// Resolve an item's absolute media path under a source base directory.
pub fn resolved_item_path(source_base: &Path, item_name: &str) -> String {
    format!("file:{}", source_base.join(item_name).display())
}

/// Content-addressed identifier: md5 hex over the resolved path. Also the
/// item's filename stem, so relocating always renames every item file.
pub fn item_identifier(resolved_path: &str) -> String {
    format!("{:x}", md5::compute(resolved_path))
}

//! The top-level project descriptor and its connection records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::item::ItemSummary;

/// Encrypted provider options: the base64 envelope carrying a
/// base-directory reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedOptions {
    pub encrypted: String,
}

/// A storage connection anchoring one of the project's two base
/// directories (source media or project output).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub name: String,
    pub provider_type: String,
    pub provider_options: EncryptedOptions,
    pub id: String,
}

/// One entry of the project's tag vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagDefinition {
    pub name: String,
    pub color: String,
}

/// The single top-level descriptor of a tagging project.
///
/// Blocks the relocation engine does not interpret (video settings,
/// active-learning settings, export format, ...) are preserved verbatim
/// through the flattened `extra` map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescriptor {
    pub name: String,
    pub security_token: String,
    pub source_connection: Connection,
    pub target_connection: Connection,
    #[serde(default)]
    pub tags: Vec<TagDefinition>,
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_visited_item_id: Option<String>,
    /// Item index: identifier → summary, rewritten wholesale on relocation
    /// to exactly mirror the item descriptors found in the tree.
    #[serde(default)]
    pub items: BTreeMap<String, ItemSummary>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

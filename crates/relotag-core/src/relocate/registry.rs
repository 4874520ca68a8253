//! Per-run session state shared between the two walk phases.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::crypto::SecurityKey;
use crate::project::{Descriptor, ItemSummary};

use super::RelocateError;

/// Registry key under which the project descriptor is registered for
/// persistence; items use their old identifier instead.
pub(crate) const PROJECT_KEY: &str = "project";

/// The old and new base directories of a project.
#[derive(Debug, Clone)]
pub struct Bases {
    pub old_source: PathBuf,
    pub old_target: PathBuf,
    pub new_source: PathBuf,
    pub new_target: PathBuf,
}

/// Accumulator for the discovery pass. Only the project descriptor fills
/// it in; item descriptors contribute nothing until the fix pass.
#[derive(Debug, Default)]
pub(crate) struct Discovery {
    key: Option<SecurityKey>,
    bases: Option<Bases>,
}

impl Discovery {
    pub(crate) fn record(&mut self, key: SecurityKey, bases: Bases) {
        // A second project descriptor overwrites the first; trees with more
        // than one are unsupported.
        self.key = Some(key);
        self.bases = Some(bases);
    }

    /// Close the discovery phase. Failing here is the structural barrier:
    /// no fix work can start without a key and resolved bases.
    pub(crate) fn finish(self) -> Result<Session, RelocateError> {
        match (self.key, self.bases) {
            (Some(key), Some(bases)) => Ok(Session::new(key, bases)),
            _ => Err(RelocateError::MissingProject),
        }
    }
}

/// Session state for the fix and persist phases: the security key, the
/// resolved bases, the accumulated item index, and every descriptor still
/// to be written, keyed by the name its file currently has on disk.
#[derive(Debug)]
pub(crate) struct Session {
    pub(crate) key: SecurityKey,
    pub(crate) bases: Bases,
    pub(crate) items: BTreeMap<String, ItemSummary>,
    pub(crate) pending: BTreeMap<String, Descriptor>,
}

impl Session {
    fn new(key: SecurityKey, bases: Bases) -> Self {
        Self {
            key,
            bases,
            items: BTreeMap::new(),
            pending: BTreeMap::new(),
        }
    }

    /// Add an item summary to the index under its (new) identifier.
    pub(crate) fn index_item(&mut self, summary: ItemSummary) {
        self.items.insert(summary.id.clone(), summary);
    }

    /// Register a descriptor for the persist phase.
    pub(crate) fn register(&mut self, key: impl Into<String>, descriptor: Descriptor) {
        self.pending.insert(key.into(), descriptor);
    }
}

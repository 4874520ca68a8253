//! Two-phase relocation of a moved project tree.
//!
//! The engine walks the destination tree twice. The first pass discovers
//! the old base directories by decrypting the project descriptor's
//! connection references and rebases them against the destination; the
//! second pass rewrites every descriptor against the new bases. A final
//! persist step serializes each registered descriptor and renames it into
//! its new content-addressed filename. The phases are strictly ordered:
//! fixing cannot start before discovery has returned a complete session,
//! and nothing is written before the fix pass has seen every descriptor.

pub mod key_source;
pub mod registry;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::crypto::{EnvelopeError, decode_folder_reference, encode_folder_reference};
use crate::paths::{self, PathError};
use crate::project::{self, Descriptor, ITEM_FILE_SUFFIX, item_identifier, resolved_item_path};

pub use key_source::{KeySource, KeySourceError};
pub use registry::Bases;
use registry::{Discovery, PROJECT_KEY, Session};

/// A fatal relocation failure. Per-file read/parse problems never surface
/// here; they are logged and skipped during the walks.
#[derive(Error, Debug)]
pub enum RelocateError {
    /// The destination tree contains no parsable project descriptor, so
    /// there is no key label and no encrypted bases to work from.
    #[error("no project descriptor found in the destination tree")]
    MissingProject,

    #[error("key source error: {0}")]
    KeySource(#[from] KeySourceError),

    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("path error: {0}")]
    Path(#[from] PathError),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Outcome of a completed relocation run.
#[derive(Debug)]
pub struct RelocationSummary {
    /// Number of item descriptors rewritten and renamed.
    pub items: usize,
    /// The old and new base directories.
    pub bases: Bases,
}

/// Relocates one project tree. Owns a single run; construct a new one per
/// destination.
pub struct Relocator<'k> {
    root: PathBuf,
    key_source: &'k dyn KeySource,
}

impl<'k> Relocator<'k> {
    /// Create a relocator for a destination directory. The path is made
    /// absolute here because every rebased path derives from it.
    pub fn new(
        destination: impl AsRef<Path>,
        key_source: &'k dyn KeySource,
    ) -> Result<Self, RelocateError> {
        let root = std::path::absolute(destination)?;
        Ok(Self { root, key_source })
    }

    /// Run all three phases. Any failure past discovery aborts the run
    /// with no rollback: the tree may be left in a mixed old/new state.
    pub fn run(self) -> Result<RelocationSummary, RelocateError> {
        info!(destination = %self.root.display(), "discovering base directories");
        let mut discovery = Discovery::default();
        visit_descriptors(&self.root, |descriptor| {
            self.discover(descriptor, &mut discovery)
        })?;
        let mut session = discovery.finish()?;
        info!(
            old_source = %session.bases.old_source.display(),
            new_source = %session.bases.new_source.display(),
            old_target = %session.bases.old_target.display(),
            new_target = %session.bases.new_target.display(),
            "rewriting descriptors"
        );

        // Full re-scan rather than a cached file list: classification only
        // depends on filenames, but the tree is the source of truth.
        visit_descriptors(&self.root, |descriptor| Self::fix(descriptor, &mut session))?;

        let bases = session.bases.clone();
        let items = Self::persist(session)?;
        info!(items, "relocation complete");
        Ok(RelocationSummary { items, bases })
    }

    /// Discovery: only the project descriptor does real work. Items depend
    /// on session state that may not exist yet in this pass, so they are
    /// deliberately a no-op here.
    fn discover(
        &self,
        descriptor: Descriptor,
        discovery: &mut Discovery,
    ) -> Result<(), RelocateError> {
        let Descriptor::Project(project) = descriptor else {
            return Ok(());
        };

        let key = self.key_source.resolve(&project.security_token)?;
        let old_target =
            decode_folder_reference(&key, &project.target_connection.provider_options.encrypted)?;
        let old_source =
            decode_folder_reference(&key, &project.source_connection.provider_options.encrypted)?;

        let (source_suffix, target_suffix) = paths::common_suffix_split(&old_source, &old_target);
        let (new_source, new_target) = paths::rebase(&self.root, &target_suffix, &source_suffix)?;
        debug!(
            source_suffix = %source_suffix.display(),
            target_suffix = %target_suffix.display(),
            "rebased project ancestor"
        );

        discovery.record(
            key,
            Bases {
                old_source,
                old_target,
                new_source,
                new_target,
            },
        );
        Ok(())
    }

    /// Fixing: both variants mutate themselves against the new bases and
    /// register for the persist phase.
    fn fix(descriptor: Descriptor, session: &mut Session) -> Result<(), RelocateError> {
        match descriptor {
            Descriptor::Project(mut project) => {
                project.target_connection.provider_options.encrypted =
                    encode_folder_reference(&session.key, &session.bases.new_target)?;
                project.source_connection.provider_options.encrypted =
                    encode_folder_reference(&session.key, &session.bases.new_source)?;
                session.register(PROJECT_KEY, Descriptor::Project(project));
            }
            Descriptor::Item(mut item) => {
                let path = resolved_item_path(&session.bases.new_source, &item.item.name);
                // The old identifier keys the registry entry so the persist
                // phase can find the file under its current name.
                let old_id = std::mem::replace(&mut item.item.id, item_identifier(&path));
                item.item.path = path;
                debug!(old_id = %old_id, new_id = %item.item.id, "re-addressed item");
                session.index_item(item.item.clone());
                session.register(old_id, Descriptor::Item(item));
            }
        }
        Ok(())
    }

    /// Persisting: write every registered descriptor to its current name,
    /// then rename to the new one (a no-op for the project descriptor,
    /// whose name does not change).
    fn persist(mut session: Session) -> Result<usize, RelocateError> {
        let pending = std::mem::take(&mut session.pending);
        let items = std::mem::take(&mut session.items);
        let dir = session.bases.new_target.clone();
        let item_count = items.len();

        for (key, mut descriptor) in pending {
            if let Descriptor::Project(project) = &mut descriptor {
                // Attached only now, after the fix pass has visited every
                // item, so the index is complete regardless of walk order.
                project.items = items.clone();
            }

            let current = dir.join(current_file_name(&key, &descriptor));
            let destination = dir.join(descriptor.file_name());
            fs::write(&current, descriptor.to_pretty_json()?)?;
            if current != destination {
                fs::rename(&current, &destination)?;
            }
            debug!(file = %destination.display(), "persisted descriptor");
        }

        Ok(item_count)
    }
}

/// The on-disk name a registered descriptor currently has: the literal
/// project filename, or the old identifier for items.
fn current_file_name(key: &str, descriptor: &Descriptor) -> String {
    if key == PROJECT_KEY {
        descriptor.file_name()
    } else {
        format!("{key}{ITEM_FILE_SUFFIX}")
    }
}

/// Walk the tree once and invoke `visit` on every parsable descriptor.
/// Unrecognized, unreadable, or malformed files are logged and skipped;
/// walk-level errors abort the run.
fn visit_descriptors<F>(root: &Path, mut visit: F) -> Result<(), RelocateError>
where
    F: FnMut(Descriptor) -> Result<(), RelocateError>,
{
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let Some(kind) = project::classify(name) else {
            debug!(path = %entry.path().display(), "not a descriptor, skipped");
            continue;
        };
        match project::load(entry.path(), kind) {
            Ok(descriptor) => visit(descriptor)?,
            Err(err) => warn!(path = %entry.path().display(), error = %err, "skipped descriptor"),
        }
    }
    Ok(())
}

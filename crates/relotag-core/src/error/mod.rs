//! Error types for the relocation engine, re-exported in one place.

pub use crate::crypto::EnvelopeError;
pub use crate::paths::PathError;
pub use crate::project::LoadError;
pub use crate::relocate::{KeySourceError, RelocateError};

//! Security key acquisition collaborator.

use thiserror::Error;

use crate::crypto::SecurityKey;

/// Errors raised while obtaining the security key. Always fatal: without a
/// key no base-path reference can be decrypted.
#[derive(Error, Debug)]
pub enum KeySourceError {
    #[error("failed to read security key: {0}")]
    Io(#[from] std::io::Error),

    #[error("security key is empty")]
    Empty,
}

/// Resolves the security key for a relocation run.
///
/// The engine calls this exactly once, when the project descriptor is
/// discovered, passing the descriptor's stored token name so interactive
/// implementations can label their prompt.
pub trait KeySource {
    fn resolve(&self, token_name: &str) -> Result<SecurityKey, KeySourceError>;
}

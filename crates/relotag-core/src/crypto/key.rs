//! Security key material for a relocation run.

use secrecy::{ExposeSecret, SecretString};

use super::EnvelopeError;
use base64::{Engine as _, engine::general_purpose::STANDARD};

/// The symmetric key for a relocation run: the base64 text of the raw AES
/// key, as read from a key file or an interactive prompt.
///
/// Held in memory for the lifetime of the run and never persisted. The
/// wrapped [`SecretString`] keeps the material out of debug output and
/// zeroizes it on drop.
#[derive(Clone, Debug)]
pub struct SecurityKey(SecretString);

impl SecurityKey {
    pub fn new(material: impl Into<String>) -> Self {
        Self(SecretString::from(material.into()))
    }

    /// Decode the raw AES key bytes (16, 24 or 32 of them for a well-formed
    /// key; length is validated at cipher selection, not here).
    pub(crate) fn material(&self) -> Result<Vec<u8>, EnvelopeError> {
        STANDARD
            .decode(self.0.expose_secret())
            .map_err(|_| EnvelopeError::InvalidKeyFormat)
    }
}

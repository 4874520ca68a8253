//! Cryptographic envelope handling for encrypted base-path references

pub mod envelope;
pub mod key;

use thiserror::Error;

/// Errors that can occur while encoding or decoding an encrypted envelope.
///
/// Two variants carry humanized messages surfaced directly to the user:
/// [`EnvelopeError::InvalidKeyFormat`] for malformed base64 (either the key
/// material itself or the stored envelope) and [`EnvelopeError::InvalidKey`]
/// for JSON that fails to parse at the syntax level. A well-formed envelope
/// decrypted with the wrong key produces garbage plaintext, which surfaces
/// as `InvalidKey` when the payload parse fails, never a panic.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The security key or envelope is not valid base64.
    #[error("security key format is not valid")]
    InvalidKeyFormat,

    /// Decrypted or envelope JSON is syntactically malformed, which is the
    /// observable symptom of a wrong or corrupted security key.
    #[error("security key is not valid")]
    InvalidKey,

    /// The decoded key material is not a supported AES key size.
    #[error("invalid security key length: expected 16, 24 or 32 bytes, got {actual}")]
    InvalidKeyLength { actual: usize },

    /// The initialization vector is shorter than one cipher block.
    #[error("initialization vector too short: {actual} bytes")]
    InvalidIv { actual: usize },

    /// The ciphertext length is not a whole number of cipher blocks.
    #[error("ciphertext length {actual} is not block-aligned")]
    InvalidCiphertextLength { actual: usize },

    /// Hex decoding of the ciphertext or IV failed.
    #[error("hex decode error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// A non-syntax JSON failure (I/O, data shape) during envelope handling.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub use envelope::{decode_folder_reference, decrypt, encode_folder_reference, encrypt};
pub use key::SecurityKey;

//! AES-CBC envelope codec for base-directory references.
//!
//! A reference is stored as `base64(JSON {ciphertext: hex, iv: hex})`, where
//! the ciphertext is the CBC encryption of `{"folderPath": "..."}` under the
//! run's security key. IVs are 24 random bytes hex-encoded in the envelope;
//! CBC consumes only the first block. A fresh IV is drawn for every encode,
//! so relocation never reuses an IV across references or runs.

use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit, block_padding::NoPadding};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::{EnvelopeError, SecurityKey};

/// AES block size in bytes; also the upper bound for a valid pad length.
const BLOCK_SIZE: usize = 16;

/// Length of freshly generated IVs (hex doubles this in the envelope).
const IV_LEN: usize = 24;

#[derive(Debug, Serialize, Deserialize)]
struct CipherEnvelope {
    ciphertext: String,
    iv: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct FolderReference {
    #[serde(rename = "folderPath")]
    folder_path: String,
}

/// Append PKCS-style padding: N bytes each valued N, N in `[1, BLOCK_SIZE]`.
fn pad(input: &[u8]) -> Vec<u8> {
    let pad_len = BLOCK_SIZE - (input.len() % BLOCK_SIZE);
    let mut padded = Vec::with_capacity(input.len() + pad_len);
    padded.extend_from_slice(input);
    padded.resize(input.len() + pad_len, pad_len as u8);
    padded
}

/// Strip PKCS-style padding by reading the last byte as the pad length.
///
/// If the trailing byte is not a plausible pad length the buffer passes
/// through unmodified: a corrupted or foreign ciphertext is not detected
/// here, the caller's subsequent JSON parse is the validation gate.
fn unpad(mut buf: Vec<u8>) -> Vec<u8> {
    if let Some(&last) = buf.last() {
        let pad_len = last as usize;
        if (1..=BLOCK_SIZE).contains(&pad_len) && pad_len <= buf.len() {
            buf.truncate(buf.len() - pad_len);
        }
    }
    buf
}

fn cbc_encrypt(key: &[u8], iv: &[u8], padded: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    // Key length selects the AES variant; `new_from_slices` cannot fail after
    // the length match and the caller guarantees a full-block IV.
    match key.len() {
        16 => Ok(cbc::Encryptor::<aes::Aes128>::new_from_slices(key, iv)
            .expect("key and IV lengths checked")
            .encrypt_padded_vec_mut::<NoPadding>(padded)),
        24 => Ok(cbc::Encryptor::<aes::Aes192>::new_from_slices(key, iv)
            .expect("key and IV lengths checked")
            .encrypt_padded_vec_mut::<NoPadding>(padded)),
        32 => Ok(cbc::Encryptor::<aes::Aes256>::new_from_slices(key, iv)
            .expect("key and IV lengths checked")
            .encrypt_padded_vec_mut::<NoPadding>(padded)),
        actual => Err(EnvelopeError::InvalidKeyLength { actual }),
    }
}

fn cbc_decrypt(key: &[u8], iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    if !ciphertext.len().is_multiple_of(BLOCK_SIZE) {
        return Err(EnvelopeError::InvalidCiphertextLength {
            actual: ciphertext.len(),
        });
    }
    let plaintext = match key.len() {
        16 => cbc::Decryptor::<aes::Aes128>::new_from_slices(key, iv)
            .expect("key and IV lengths checked")
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext),
        24 => cbc::Decryptor::<aes::Aes192>::new_from_slices(key, iv)
            .expect("key and IV lengths checked")
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext),
        32 => cbc::Decryptor::<aes::Aes256>::new_from_slices(key, iv)
            .expect("key and IV lengths checked")
            .decrypt_padded_vec_mut::<NoPadding>(ciphertext),
        actual => return Err(EnvelopeError::InvalidKeyLength { actual }),
    };
    plaintext.map_err(|_| EnvelopeError::InvalidCiphertextLength {
        actual: ciphertext.len(),
    })
}

/// Humanize JSON syntax failures; everything else stays a generic variant.
fn classify_json(err: serde_json::Error) -> EnvelopeError {
    if err.classify() == serde_json::error::Category::Syntax {
        EnvelopeError::InvalidKey
    } else {
        EnvelopeError::Json(err)
    }
}

/// Encrypt `plaintext` under `key` with an explicit hex-encoded IV and wrap
/// it in the stored envelope format.
///
/// Deterministic for identical key/IV/plaintext, which makes exact
/// reproducibility testable.
pub fn encrypt(key: &SecurityKey, plaintext: &[u8], iv_hex: &str) -> Result<String, EnvelopeError> {
    let secret = key.material()?;
    let iv = hex::decode(iv_hex)?;
    if iv.len() < BLOCK_SIZE {
        return Err(EnvelopeError::InvalidIv { actual: iv.len() });
    }

    let ciphertext = cbc_encrypt(&secret, &iv[..BLOCK_SIZE], &pad(plaintext))?;
    let envelope = CipherEnvelope {
        ciphertext: hex::encode(ciphertext),
        iv: iv_hex.to_owned(),
    };
    Ok(STANDARD.encode(serde_json::to_vec(&envelope)?))
}

/// Unwrap an envelope and decrypt its ciphertext under `key`.
///
/// Returns raw plaintext bytes: with the wrong key these are garbage that
/// the caller's JSON parse rejects.
pub fn decrypt(key: &SecurityKey, envelope: &str) -> Result<Vec<u8>, EnvelopeError> {
    let secret = key.material()?;
    let raw = STANDARD
        .decode(envelope)
        .map_err(|_| EnvelopeError::InvalidKeyFormat)?;
    let envelope: CipherEnvelope = serde_json::from_slice(&raw).map_err(classify_json)?;

    let iv = hex::decode(&envelope.iv)?;
    if iv.len() < BLOCK_SIZE {
        return Err(EnvelopeError::InvalidIv { actual: iv.len() });
    }
    let ciphertext = hex::decode(&envelope.ciphertext)?;

    let plaintext = cbc_decrypt(&secret, &iv[..BLOCK_SIZE], &ciphertext)?;
    Ok(unpad(plaintext))
}

/// Decrypt a stored base-directory reference down to its absolute path.
pub fn decode_folder_reference(
    key: &SecurityKey,
    envelope: &str,
) -> Result<std::path::PathBuf, EnvelopeError> {
    let plaintext = decrypt(key, envelope)?;
    let reference: FolderReference = serde_json::from_slice(&plaintext).map_err(classify_json)?;
    Ok(std::path::PathBuf::from(reference.folder_path))
}

/// Encrypt a base-directory path into a fresh envelope with a random IV.
pub fn encode_folder_reference(
    key: &SecurityKey,
    folder_path: &std::path::Path,
) -> Result<String, EnvelopeError> {
    let mut iv = [0u8; IV_LEN];
    rand::rng().fill_bytes(&mut iv);

    let reference = FolderReference {
        folder_path: folder_path.display().to_string(),
    };
    encrypt(key, &serde_json::to_vec(&reference)?, &hex::encode(iv))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::path::{Path, PathBuf};

    fn key_of(len: usize) -> SecurityKey {
        let material: Vec<u8> = (0..len as u8).collect();
        SecurityKey::new(STANDARD.encode(material))
    }

    const IV_HEX: &str = "000102030405060708090a0b0c0d0e0f1011121314151617";

    #[test]
    fn round_trip_all_key_lengths() {
        for len in [16, 24, 32] {
            let key = key_of(len);
            let envelope = encrypt(&key, b"{\"folderPath\":\"/tmp\"}", IV_HEX).unwrap();
            assert_eq!(
                decrypt(&key, &envelope).unwrap(),
                b"{\"folderPath\":\"/tmp\"}"
            );
        }
    }

    #[test]
    fn round_trip_empty_plaintext() {
        let key = key_of(32);
        let envelope = encrypt(&key, b"", IV_HEX).unwrap();
        assert_eq!(decrypt(&key, &envelope).unwrap(), b"");
    }

    #[test]
    fn encrypt_is_deterministic_for_fixed_iv() {
        let key = key_of(16);
        let a = encrypt(&key, b"payload", IV_HEX).unwrap();
        let b = encrypt(&key, b"payload", IV_HEX).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn fresh_iv_per_folder_reference() {
        let key = key_of(16);
        let a = encode_folder_reference(&key, Path::new("/data/img")).unwrap();
        let b = encode_folder_reference(&key, Path::new("/data/img")).unwrap();
        assert_ne!(a, b);
        assert_eq!(
            decode_folder_reference(&key, &a).unwrap(),
            PathBuf::from("/data/img")
        );
        assert_eq!(
            decode_folder_reference(&key, &b).unwrap(),
            PathBuf::from("/data/img")
        );
    }

    #[test]
    fn unsupported_key_length_is_rejected() {
        let key = key_of(20);
        assert!(matches!(
            encrypt(&key, b"x", IV_HEX),
            Err(EnvelopeError::InvalidKeyLength { actual: 20 })
        ));
    }

    #[test]
    fn non_base64_envelope_is_humanized() {
        let key = key_of(16);
        assert!(matches!(
            decrypt(&key, "*** not base64 ***"),
            Err(EnvelopeError::InvalidKeyFormat)
        ));
    }

    #[test]
    fn base64_of_non_json_is_humanized() {
        let key = key_of(16);
        let envelope = STANDARD.encode("this is not an envelope");
        assert!(matches!(
            decrypt(&key, &envelope),
            Err(EnvelopeError::InvalidKey)
        ));
    }

    #[test]
    fn wrong_key_fails_payload_parse_without_panicking() {
        let right = key_of(16);
        let wrong = key_of(32);
        let envelope = encode_folder_reference(&right, Path::new("/data/img")).unwrap();
        assert!(decode_folder_reference(&wrong, &envelope).is_err());
    }

    #[test]
    fn unpad_strips_valid_padding() {
        let mut buf = b"abc".to_vec();
        buf.extend_from_slice(&[13u8; 13]);
        assert_eq!(unpad(buf), b"abc");
    }

    #[test]
    fn unpad_passes_through_invalid_lengths() {
        // Pad byte above the block size: untouched.
        let buf = vec![1, 2, 3, 0xFF];
        assert_eq!(unpad(buf.clone()), buf);
        // Pad byte longer than the buffer: untouched.
        let buf = vec![9, 9, 12];
        assert_eq!(unpad(buf.clone()), buf);
        // Zero pad byte: untouched.
        let buf = vec![1, 2, 0];
        assert_eq!(unpad(buf.clone()), buf);
        // Empty buffer: untouched.
        assert!(unpad(Vec::new()).is_empty());
    }

    proptest! {
        #[test]
        fn prop_round_trip(plaintext in proptest::collection::vec(any::<u8>(), 0..512),
                           key_len in prop_oneof![Just(16usize), Just(24), Just(32)]) {
            let key = key_of(key_len);
            let envelope = encrypt(&key, &plaintext, IV_HEX).unwrap();
            prop_assert_eq!(decrypt(&key, &envelope).unwrap(), plaintext);
        }
    }
}

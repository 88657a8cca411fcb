//! Authenticated envelope codec for secret records.
//!
//! A record's sensitive fields are serialized to a fixed-key JSON object and
//! sealed as one ChaCha20-Poly1305 blob. The blob is self-describing
//! (version marker, seal timestamp, nonce, tag) and base64url encoded so it
//! stores as plain text; opening needs only the key. The `category` column
//! is deliberately not part of the payload so the server can filter without
//! ever holding a key.

use base64ct::{Base64UrlUnpadded, Encoding};
use chacha20poly1305::{
    ChaCha20Poly1305, Key, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use chrono::Utc;
use rand::{RngCore, rngs::OsRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::auth::keys::MasterKey;

/// Version marker for the blob layout below.
pub const ENVELOPE_VERSION: u8 = 0x01;

// version (1) || seal timestamp, seconds BE (8)
const HEADER_LEN: usize = 1 + 8;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed envelope")]
    Malformed,
    #[error("unsupported envelope version: {0}")]
    UnsupportedVersion(u8),
    #[error("decryption failed: wrong key or corrupted blob")]
    Decryption,
    #[error("encryption failure")]
    Encryption,
    #[error("invalid payload json")]
    Payload(#[from] serde_json::Error),
}

/// The encrypted field set of one credential entry. Fixed key set; optional
/// fields default to empty strings so the canonical JSON shape is stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SecretFields {
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub username: String,
    pub secret_value: String,
    #[serde(default)]
    pub notes: String,
}

/// Seal a field set under the master key.
///
/// Layout: `version || timestamp || nonce || ciphertext+tag`, header bytes
/// bound as AAD, the whole blob base64url encoded.
///
/// # Errors
/// Returns an error if serialization or encryption fails.
pub fn seal(fields: &SecretFields, key: &MasterKey) -> Result<String, EnvelopeError> {
    let plaintext = serde_json::to_vec(fields)?;

    let mut header = [0u8; HEADER_LEN];
    header[0] = ENVELOPE_VERSION;
    let timestamp = u64::try_from(Utc::now().timestamp()).unwrap_or_default();
    if let Some(slot) = header.get_mut(1..) {
        slot.copy_from_slice(&timestamp.to_be_bytes());
    }

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: &plaintext,
                aad: &header,
            },
        )
        .map_err(|_| EnvelopeError::Encryption)?;

    let mut blob = Vec::with_capacity(HEADER_LEN + NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&header);
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);

    Ok(Base64UrlUnpadded::encode_string(&blob))
}

/// Open a sealed blob with the master key.
///
/// # Errors
/// `Malformed` for undecodable or truncated input, `UnsupportedVersion` for
/// a foreign version marker, and `Decryption` when the key is wrong or the
/// blob was tampered with. Never yields garbage plaintext.
pub fn open(blob: &str, key: &MasterKey) -> Result<SecretFields, EnvelopeError> {
    let raw = Base64UrlUnpadded::decode_vec(blob).map_err(|_| EnvelopeError::Malformed)?;
    if raw.len() < HEADER_LEN + NONCE_LEN + TAG_LEN {
        return Err(EnvelopeError::Malformed);
    }

    let (header, rest) = raw.split_at(HEADER_LEN);
    let version = *header.first().ok_or(EnvelopeError::Malformed)?;
    if version != ENVELOPE_VERSION {
        return Err(EnvelopeError::UnsupportedVersion(version));
    }

    let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()));
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| EnvelopeError::Decryption)?;

    Ok(serde_json::from_slice(&plaintext)?)
}

//! Master-key derivation from a login password and per-account salt.
//!
//! The key is deterministic for a given (password, salt) pair, never
//! persisted, and only ever travels inside a full session artifact. A slow
//! PBKDF2 round count keeps offline attacks against a leaked verifier
//! expensive.

use hex::FromHex;
use pbkdf2::pbkdf2_hmac;
use rand::{RngCore, rngs::OsRng};
use sha2::Sha256;
use std::fmt;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Width of the derived symmetric key in bytes.
pub const KEY_LEN: usize = 32;

/// PBKDF2-HMAC-SHA-256 round count. Tunable: bounds single-login latency
/// while keeping offline brute force slow.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Bytes of randomness behind the per-account salt (stored hex encoded).
const SALT_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid hex key encoding")]
    Encoding,
}

/// 32-byte symmetric master key, wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct MasterKey([u8; KEY_LEN]);

impl MasterKey {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }

    /// Hex form of the key, the representation carried by session artifacts.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse hex key material, width-normalizing whatever decodes.
    ///
    /// # Errors
    /// Returns `KeyError::Encoding` if the input is not valid hex.
    pub fn from_hex(material: &str) -> Result<Self, KeyError> {
        let mut bytes = Vec::from_hex(material).map_err(|_| KeyError::Encoding)?;
        let key = Self(normalize_key_width(&bytes));
        bytes.zeroize();
        Ok(key)
    }
}

impl fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

/// Derive the master key for an account from the login password and the
/// account salt. Deterministic: the same inputs always yield the same key.
#[must_use]
pub fn derive_key(password: &str, salt: &str) -> MasterKey {
    let mut out = [0u8; KEY_LEN];
    pbkdf2_hmac::<Sha256>(
        password.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut out,
    );
    let key = MasterKey(normalize_key_width(&out));
    out.zeroize();
    key
}

/// Truncate or zero-pad raw key material to exactly [`KEY_LEN`] bytes.
///
/// Identity for native derivation output; kept as an explicit step so blobs
/// sealed from variable-width imported material stay decryptable.
#[must_use]
pub fn normalize_key_width(material: &[u8]) -> [u8; KEY_LEN] {
    let mut out = [0u8; KEY_LEN];
    let len = material.len().min(KEY_LEN);
    if let (Some(dst), Some(src)) = (out.get_mut(..len), material.get(..len)) {
        dst.copy_from_slice(src);
    }
    out
}

/// Fresh random per-account salt, generated once at registration. Changing
/// it afterwards would orphan every record sealed under the old key.
#[must_use]
pub fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_key_is_deterministic() {
        let first = derive_key("Passw0rd!", "aabbccdd");
        let second = derive_key("Passw0rd!", "aabbccdd");
        assert_eq!(first, second);
    }

    #[test]
    fn derive_key_depends_on_password_and_salt() {
        let base = derive_key("Passw0rd!", "aabbccdd");
        assert_ne!(base, derive_key("Passw0rd?", "aabbccdd"));
        assert_ne!(base, derive_key("Passw0rd!", "ddccbbaa"));
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn hex_round_trip() {
        let key = derive_key("Passw0rd!", "aabbccdd");
        let encoded = key.to_hex();
        assert_eq!(encoded.len(), KEY_LEN * 2);
        assert_eq!(MasterKey::from_hex(&encoded).unwrap(), key);
    }

    #[test]
    fn from_hex_rejects_non_hex() {
        assert!(MasterKey::from_hex("not-hex!").is_err());
    }

    #[test]
    fn normalize_pads_short_material() {
        let normalized = normalize_key_width(&[1, 2, 3]);
        assert_eq!(&normalized[..3], &[1, 2, 3]);
        assert!(normalized[3..].iter().all(|&b| b == 0));
    }

    #[test]
    fn normalize_truncates_long_material() {
        let long = [7u8; 48];
        let normalized = normalize_key_width(&long);
        assert_eq!(normalized, [7u8; KEY_LEN]);
    }

    #[test]
    fn generate_salt_is_hex_and_unique() {
        let salt = generate_salt();
        assert_eq!(salt.len(), 32);
        assert!(salt.bytes().all(|b| b.is_ascii_hexdigit()));
        assert_ne!(salt, generate_salt());
    }
}

//! Password verifier hashing.
//!
//! Argon2id with its own random salt, independent of the account salt used
//! for key derivation. The verifier can prove a password is correct but can
//! never recover the master key.

use anyhow::{Result, anyhow};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

/// Syntactically valid verifier for a throwaway password. Verified against
/// when the username does not exist so a login attempt performs the same
/// amount of work either way.
const DUMMY_VERIFIER: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY";

/// Hash a password into a PHC-format verifier string.
///
/// # Errors
/// Returns an error if hashing fails.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Check a password against a stored verifier. Unparseable verifiers count
/// as a mismatch.
#[must_use]
pub fn verify_password(password: &str, verifier: &str) -> bool {
    PasswordHash::new(verifier).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Burn a verification's worth of work without a real account.
pub(crate) fn verify_dummy(password: &str) {
    let _ = verify_password(password, DUMMY_VERIFIER);
}

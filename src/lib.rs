//! cofre: a personal credential vault.
//!
//! Secret records are sealed under a key derived from the owner's login
//! password and a per-account salt; the key is never persisted and only
//! travels inside a short-lived signed session artifact. Access requires a
//! mandatory TOTP second factor once enrolled.

pub mod api;
pub mod auth;
pub mod cli;
pub mod envelope;
pub mod totp;

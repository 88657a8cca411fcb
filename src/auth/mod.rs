//! Core authentication building blocks: key derivation, password verifiers,
//! session artifacts, and the login state machine. Everything here is pure
//! over its inputs; the HTTP and storage layers live under `api`.

pub mod account;
pub mod config;
pub mod keys;
pub mod machine;
pub mod password;
pub mod token;

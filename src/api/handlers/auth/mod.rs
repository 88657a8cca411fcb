//! Authentication endpoints and session gating.
//!
//! Flow overview:
//! 1) `register` creates the account with its one-time salt and verifier.
//! 2) `login` runs the state machine: setup-required, pending-2FA, or 401.
//! 3) `2fa/verify` turns a pending artifact plus a valid code into the full
//!    key-bearing session.
//! 4) `2fa/setup`/`enable`/`disable` manage enrollment; disabling always
//!    requires proof of possession.

pub(crate) mod login;
pub(crate) mod profile;
pub(crate) mod register;
pub(crate) mod session;
pub(crate) mod state;
pub(crate) mod storage;
pub(crate) mod two_factor;
pub(crate) mod types;

pub use session::SessionContext;
pub use state::AuthState;

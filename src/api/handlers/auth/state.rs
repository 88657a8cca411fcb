//! Shared auth state injected into handlers.

use crate::auth::{config::AuthConfig, token::TokenSigner};

pub struct AuthState {
    config: AuthConfig,
    signer: TokenSigner,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig, signer: TokenSigner) -> Self {
        Self { config, signer }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn signer(&self) -> &TokenSigner {
        &self.signer
    }
}

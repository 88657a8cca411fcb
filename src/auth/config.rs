//! Auth configuration: artifact TTL tiers and the TOTP issuer label.

const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;
const DEFAULT_SETUP_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_PENDING_TTL_SECONDS: i64 = 5 * 60;
const DEFAULT_ISSUER: &str = "cofre";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    issuer: String,
    session_ttl_seconds: i64,
    setup_ttl_seconds: i64,
    pending_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            issuer: DEFAULT_ISSUER.to_string(),
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
            setup_ttl_seconds: DEFAULT_SETUP_TTL_SECONDS,
            pending_ttl_seconds: DEFAULT_PENDING_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_issuer(mut self, issuer: String) -> Self {
        self.issuer = issuer;
        self
    }

    #[must_use]
    pub fn with_session_ttl_seconds(mut self, seconds: i64) -> Self {
        self.session_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_setup_ttl_seconds(mut self, seconds: i64) -> Self {
        self.setup_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_pending_ttl_seconds(mut self, seconds: i64) -> Self {
        self.pending_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    /// Full session TTL (key-bearing artifact).
    #[must_use]
    pub fn session_ttl_seconds(&self) -> i64 {
        self.session_ttl_seconds
    }

    /// Setup-required artifact TTL.
    #[must_use]
    pub fn setup_ttl_seconds(&self) -> i64 {
        self.setup_ttl_seconds
    }

    /// Pending-2FA artifact TTL. Short: this artifact carries the raw
    /// password claim.
    #[must_use]
    pub fn pending_ttl_seconds(&self) -> i64 {
        self.pending_ttl_seconds
    }
}

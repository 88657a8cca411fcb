//! Account identity model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

/// One row of the `accounts` table.
///
/// `salt` is written once at registration and never updated afterwards: it
/// is the second input to key derivation, so changing it would orphan every
/// record sealed under the old key.
#[derive(Debug, Clone, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_verifier: String,
    pub salt: String,
    /// Base32 TOTP secret trusted for login; only meaningful while
    /// `totp_enabled` is set.
    pub totp_secret: Option<String>,
    pub totp_enabled: bool,
    /// Secret staged by setup, awaiting a code proof before it replaces
    /// `totp_secret`. Kept separate so an abandoned re-enrollment never
    /// revokes the trusted factor.
    pub pending_totp_secret: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Client-facing view; never exposes the verifier, salt, or TOTP secret.
    #[must_use]
    pub fn public(&self) -> PublicAccount {
        PublicAccount {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            totp_enabled: self.totp_enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PublicAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub totp_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//! Request/response types for secret record endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Fields are optional so validation can answer with a field-specific
/// message instead of a generic deserialization error.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct CreateSecretRequest {
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    pub secret_value: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Partial update; absent fields keep their current value.
#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct UpdateSecretRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub username: Option<String>,
    pub secret_value: Option<String>,
    pub notes: Option<String>,
    pub category: Option<String>,
}

/// One decrypted entry as returned to the owner.
#[derive(ToSchema, Serialize, Debug)]
pub struct SecretEntry {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub username: String,
    pub secret_value: String,
    pub notes: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct SecretListResponse {
    pub secrets: Vec<SecretEntry>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

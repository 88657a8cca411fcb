//! Secret record persistence. Every query is owner-scoped; there is no path
//! that reads another account's rows.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// One row of `secret_records`. `ciphertext` is the sealed blob; `category`
/// stays plaintext for server-side filtering.
#[derive(Debug, Clone, FromRow)]
pub struct SecretRecord {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub ciphertext: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub async fn list_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<SecretRecord>, sqlx::Error> {
    sqlx::query_as::<_, SecretRecord>(
        "SELECT * FROM secret_records WHERE owner_id = $1 ORDER BY created_at DESC",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

pub async fn find_for_owner(
    pool: &PgPool,
    owner_id: Uuid,
    id: Uuid,
) -> Result<Option<SecretRecord>, sqlx::Error> {
    sqlx::query_as::<_, SecretRecord>(
        "SELECT * FROM secret_records WHERE id = $1 AND owner_id = $2",
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await
}

pub async fn insert(
    pool: &PgPool,
    owner_id: Uuid,
    ciphertext: &str,
    category: &str,
) -> Result<SecretRecord, sqlx::Error> {
    sqlx::query_as::<_, SecretRecord>(
        "INSERT INTO secret_records (owner_id, ciphertext, category)
         VALUES ($1, $2, $3)
         RETURNING *",
    )
    .bind(owner_id)
    .bind(ciphertext)
    .bind(category)
    .fetch_one(pool)
    .await
}

pub async fn update(
    pool: &PgPool,
    owner_id: Uuid,
    id: Uuid,
    ciphertext: &str,
    category: &str,
) -> Result<Option<SecretRecord>, sqlx::Error> {
    sqlx::query_as::<_, SecretRecord>(
        "UPDATE secret_records
         SET ciphertext = $3, category = $4, updated_at = NOW()
         WHERE id = $1 AND owner_id = $2
         RETURNING *",
    )
    .bind(id)
    .bind(owner_id)
    .bind(ciphertext)
    .bind(category)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, owner_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM secret_records WHERE id = $1 AND owner_id = $2")
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

pub async fn categories_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category FROM secret_records
         WHERE owner_id = $1 AND category <> ''
         ORDER BY category",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

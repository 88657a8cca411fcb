//! Account persistence.
//!
//! Free functions over the pool, one query each. Enrollment is two-phase on
//! purpose: a secret is staged with `set_pending_totp_secret` and only
//! trusted once `enable_totp` flips the flag after a code proved possession.

use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::account::Account;

pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>("SELECT * FROM accounts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn insert_account(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_verifier: &str,
    salt: &str,
) -> Result<Account, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        "INSERT INTO accounts (username, email, password_verifier, salt)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(username)
    .bind(email)
    .bind(password_verifier)
    .bind(salt)
    .fetch_one(pool)
    .await
}

pub async fn update_verifier(
    pool: &PgPool,
    id: Uuid,
    password_verifier: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE accounts SET password_verifier = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(password_verifier)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Stage a new TOTP secret without trusting it. The trusted secret and
/// enabled flag are untouched, so abandoning enrollment here changes
/// nothing about how the account logs in.
pub async fn set_pending_totp_secret(
    pool: &PgPool,
    id: Uuid,
    secret: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE accounts
         SET pending_totp_secret = $2, updated_at = NOW()
         WHERE id = $1",
    )
    .bind(id)
    .bind(secret)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Promote the staged secret to the trusted one. Refuses to act when
/// nothing is staged.
pub async fn enable_totp(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE accounts
         SET totp_secret = pending_totp_secret,
             totp_enabled = TRUE,
             pending_totp_secret = NULL,
             updated_at = NOW()
         WHERE id = $1 AND pending_totp_secret IS NOT NULL",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Remove trusted and staged secrets so a later re-enrollment starts clean.
pub async fn disable_totp(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE accounts
         SET totp_secret = NULL,
             totp_enabled = FALSE,
             pending_totp_secret = NULL,
             updated_at = NOW()
         WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

//! Secret record endpoints.
//!
//! Every read and write goes through the envelope codec with the session's
//! master key. The server never stores plaintext fields; only `category`
//! lives outside the blob. Deletion is the one operation that works without
//! a key because it touches no ciphertext.

pub(crate) mod storage;
pub(crate) mod types;

use axum::{
    Extension, Json,
    extract::Path,
    http::StatusCode,
    response::Response,
};
use sqlx::PgPool;
use tracing::{error, info, warn};
use uuid::Uuid;

use self::storage::SecretRecord;
use self::types::{
    CategoriesResponse, CreateSecretRequest, SecretEntry, SecretListResponse, UpdateSecretRequest,
};
use super::auth::SessionContext;
use super::message;
use crate::auth::keys::MasterKey;
use crate::envelope::{self, EnvelopeError, SecretFields};

fn storage_error(err: &sqlx::Error) -> Response {
    error!("secret record query: {err}");
    message(StatusCode::INTERNAL_SERVER_ERROR, "request failed")
}

fn entry(record: &SecretRecord, fields: SecretFields) -> SecretEntry {
    SecretEntry {
        id: record.id,
        title: fields.title,
        url: fields.url,
        username: fields.username,
        secret_value: fields.secret_value,
        notes: fields.notes,
        category: record.category.clone(),
        created_at: record.created_at,
        updated_at: record.updated_at,
    }
}

#[utoipa::path(
    get,
    path = "/v1/secrets",
    responses(
        (status = 200, description = "Decrypted records for the owner", body = SecretListResponse),
        (status = 401, description = "Missing key-bearing session")
    ),
    security(("bearer" = [])),
    tag = "secrets"
)]
pub async fn list(
    session: SessionContext,
    Extension(pool): Extension<PgPool>,
) -> Result<Json<SecretListResponse>, Response> {
    session.require_full()?;
    let key = session.require_key()?;

    let records = storage::list_for_owner(&pool, session.account_id)
        .await
        .map_err(|err| storage_error(&err))?;

    // An undecryptable row hides itself instead of failing the listing.
    let mut secrets = Vec::with_capacity(records.len());
    for record in &records {
        match envelope::open(&record.ciphertext, key) {
            Ok(fields) => secrets.push(entry(record, fields)),
            Err(err) => {
                warn!(record_id = %record.id, "skipping undecryptable record: {err}");
            }
        }
    }

    Ok(Json(SecretListResponse { secrets }))
}

#[utoipa::path(
    get,
    path = "/v1/secrets/{id}",
    params(("id" = Uuid, Path, description = "Record id")),
    responses(
        (status = 200, description = "Decrypted record", body = SecretEntry),
        (status = 400, description = "Record cannot be decrypted"),
        (status = 404, description = "No such record")
    ),
    security(("bearer" = [])),
    tag = "secrets"
)]
pub async fn fetch(
    session: SessionContext,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<SecretEntry>, Response> {
    session.require_full()?;
    let key = session.require_key()?;

    let record = storage::find_for_owner(&pool, session.account_id, id)
        .await
        .map_err(|err| storage_error(&err))?
        .ok_or_else(|| message(StatusCode::NOT_FOUND, "secret not found"))?;

    let fields = open_record(&record, key)?;
    Ok(Json(entry(&record, fields)))
}

fn open_record(record: &SecretRecord, key: &MasterKey) -> Result<SecretFields, Response> {
    envelope::open(&record.ciphertext, key).map_err(|err| match err {
        EnvelopeError::Decryption | EnvelopeError::Malformed => {
            warn!(record_id = %record.id, "record decryption failed: {err}");
            message(StatusCode::BAD_REQUEST, "secret cannot be decrypted")
        }
        other => {
            error!(record_id = %record.id, "opening record: {other}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "request failed")
        }
    })
}

#[utoipa::path(
    post,
    path = "/v1/secrets",
    request_body = CreateSecretRequest,
    responses(
        (status = 201, description = "Record sealed and stored", body = SecretEntry),
        (status = 400, description = "Missing required field")
    ),
    security(("bearer" = [])),
    tag = "secrets"
)]
pub async fn create(
    session: SessionContext,
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<CreateSecretRequest>,
) -> Result<(StatusCode, Json<SecretEntry>), Response> {
    session.require_full()?;
    let key = session.require_key()?;

    let title = payload
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| message(StatusCode::BAD_REQUEST, "title is required"))?;
    let secret_value = payload
        .secret_value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| message(StatusCode::BAD_REQUEST, "secret_value is required"))?;

    let fields = SecretFields {
        title: title.to_string(),
        url: payload.url.unwrap_or_default(),
        username: payload.username.unwrap_or_default(),
        secret_value: secret_value.to_string(),
        notes: payload.notes.unwrap_or_default(),
    };

    let blob = envelope::seal(&fields, key).map_err(|err| {
        error!("sealing record: {err}");
        message(StatusCode::INTERNAL_SERVER_ERROR, "storing secret failed")
    })?;

    let category = payload.category.unwrap_or_default();
    let record = storage::insert(&pool, session.account_id, &blob, category.trim())
        .await
        .map_err(|err| storage_error(&err))?;

    info!(record_id = %record.id, "secret record created");

    Ok((StatusCode::CREATED, Json(entry(&record, fields))))
}

#[utoipa::path(
    put,
    path = "/v1/secrets/{id}",
    params(("id" = Uuid, Path, description = "Record id")),
    request_body = UpdateSecretRequest,
    responses(
        (status = 200, description = "Record resealed", body = SecretEntry),
        (status = 400, description = "Record cannot be decrypted"),
        (status = 404, description = "No such record")
    ),
    security(("bearer" = [])),
    tag = "secrets"
)]
pub async fn update(
    session: SessionContext,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateSecretRequest>,
) -> Result<Json<SecretEntry>, Response> {
    session.require_full()?;
    let key = session.require_key()?;

    let record = storage::find_for_owner(&pool, session.account_id, id)
        .await
        .map_err(|err| storage_error(&err))?
        .ok_or_else(|| message(StatusCode::NOT_FOUND, "secret not found"))?;

    // Decrypt, merge, reseal: absent fields keep their stored value.
    let mut fields = open_record(&record, key)?;
    if let Some(title) = payload.title {
        fields.title = title;
    }
    if let Some(url) = payload.url {
        fields.url = url;
    }
    if let Some(username) = payload.username {
        fields.username = username;
    }
    if let Some(secret_value) = payload.secret_value {
        fields.secret_value = secret_value;
    }
    if let Some(notes) = payload.notes {
        fields.notes = notes;
    }
    let category = payload
        .category
        .unwrap_or_else(|| record.category.clone());

    let blob = envelope::seal(&fields, key).map_err(|err| {
        error!("sealing record: {err}");
        message(StatusCode::INTERNAL_SERVER_ERROR, "updating secret failed")
    })?;

    let updated = storage::update(&pool, session.account_id, id, &blob, category.trim())
        .await
        .map_err(|err| storage_error(&err))?
        .ok_or_else(|| message(StatusCode::NOT_FOUND, "secret not found"))?;

    info!(record_id = %updated.id, "secret record updated");

    Ok(Json(entry(&updated, fields)))
}

#[utoipa::path(
    delete,
    path = "/v1/secrets/{id}",
    params(("id" = Uuid, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record deleted"),
        (status = 404, description = "No such record")
    ),
    security(("bearer" = [])),
    tag = "secrets"
)]
pub async fn remove(
    session: SessionContext,
    Extension(pool): Extension<PgPool>,
    Path(id): Path<Uuid>,
) -> Result<Response, Response> {
    session.require_full()?;

    let deleted = storage::delete(&pool, session.account_id, id)
        .await
        .map_err(|err| storage_error(&err))?;
    if deleted == 0 {
        return Err(message(StatusCode::NOT_FOUND, "secret not found"));
    }

    info!(record_id = %id, "secret record deleted");

    Ok(message(StatusCode::OK, "secret deleted"))
}

#[utoipa::path(
    get,
    path = "/v1/secrets/categories",
    responses(
        (status = 200, description = "Distinct non-empty categories", body = CategoriesResponse)
    ),
    security(("bearer" = [])),
    tag = "secrets"
)]
pub async fn categories(
    session: SessionContext,
    Extension(pool): Extension<PgPool>,
) -> Result<Json<CategoriesResponse>, Response> {
    session.require_full()?;

    let categories = storage::categories_for_owner(&pool, session.account_id)
        .await
        .map_err(|err| storage_error(&err))?;

    Ok(Json(CategoriesResponse { categories }))
}

//! Profile view and password change.

use axum::{Extension, Json, http::StatusCode, response::Response};
use sqlx::PgPool;
use tracing::{error, info, warn};

use super::session::SessionContext;
use super::storage;
use super::types::{ChangePasswordRequest, ProfileResponse};
use crate::api::handlers::message;
use crate::auth::password::{hash_password, verify_password};

const MIN_PASSWORD_LEN: usize = 8;

#[utoipa::path(
    get,
    path = "/v1/auth/profile",
    responses(
        (status = 200, description = "Current account", body = ProfileResponse),
        (status = 401, description = "Missing or invalid session")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn profile(
    session: SessionContext,
    Extension(pool): Extension<PgPool>,
) -> Result<Json<ProfileResponse>, Response> {
    session.require_full()?;

    let account = storage::find_by_id(&pool, session.account_id)
        .await
        .map_err(|err| {
            error!("looking up account: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "request failed")
        })?
        .ok_or_else(|| message(StatusCode::UNAUTHORIZED, "invalid session artifact"))?;

    Ok(Json(ProfileResponse {
        account: account.public(),
    }))
}

/// Changes the password verifier only. The derivation salt is immutable, so
/// records sealed before the change stay readable only under the old
/// password's key; the session issued for the old password keeps working
/// until it expires.
#[utoipa::path(
    put,
    path = "/v1/auth/password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Old password mismatch")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn change_password(
    session: SessionContext,
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Response, Response> {
    session.require_full()?;

    if payload.new_password.len() < MIN_PASSWORD_LEN {
        return Err(message(
            StatusCode::BAD_REQUEST,
            "password must be at least 8 characters",
        ));
    }

    let account = storage::find_by_id(&pool, session.account_id)
        .await
        .map_err(|err| {
            error!("looking up account: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "password change failed")
        })?
        .ok_or_else(|| message(StatusCode::UNAUTHORIZED, "invalid session artifact"))?;

    if !verify_password(&payload.old_password, &account.password_verifier) {
        warn!(account_id = %account.id, "password change with wrong old password");
        return Err(message(StatusCode::UNAUTHORIZED, "invalid password"));
    }

    let verifier = hash_password(&payload.new_password).map_err(|err| {
        error!("hashing password: {err}");
        message(StatusCode::INTERNAL_SERVER_ERROR, "password change failed")
    })?;

    storage::update_verifier(&pool, account.id, &verifier)
        .await
        .map_err(|err| {
            error!("updating verifier: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "password change failed")
        })?;

    info!(account_id = %account.id, "password changed");

    Ok(message(StatusCode::OK, "password changed"))
}

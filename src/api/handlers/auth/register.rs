//! Account registration.

use axum::{Extension, Json, http::StatusCode, response::Response};
use sqlx::PgPool;
use tracing::{error, info};

use super::storage;
use super::types::{RegisterRequest, RegisterResponse};
use crate::api::handlers::{is_unique_violation, message, valid_email};
use crate::auth::keys::generate_salt;
use crate::auth::password::hash_password;

const MIN_PASSWORD_LEN: usize = 8;

#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid field"),
        (status = 409, description = "Username or email already taken")
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), Response> {
    let username = payload.username.trim();
    let email = payload.email.trim();

    if username.is_empty() {
        return Err(message(StatusCode::BAD_REQUEST, "username is required"));
    }
    if !valid_email(email) {
        return Err(message(StatusCode::BAD_REQUEST, "invalid email address"));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(message(
            StatusCode::BAD_REQUEST,
            "password must be at least 8 characters",
        ));
    }

    let verifier = hash_password(&payload.password).map_err(|err| {
        error!("hashing password: {err}");
        message(StatusCode::INTERNAL_SERVER_ERROR, "registration failed")
    })?;

    // Written once; key derivation depends on it for the account's lifetime.
    let salt = generate_salt();

    let account = storage::insert_account(&pool, username, email, &verifier, &salt)
        .await
        .map_err(|err| {
            if is_unique_violation(&err) {
                message(StatusCode::CONFLICT, "username or email already taken")
            } else {
                error!("inserting account: {err}");
                message(StatusCode::INTERNAL_SERVER_ERROR, "registration failed")
            }
        })?;

    info!(account_id = %account.id, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "account created".to_string(),
            account: account.public(),
        }),
    ))
}

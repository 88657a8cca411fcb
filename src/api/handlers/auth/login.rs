//! Login and pending-2FA verification.
//!
//! `login` never returns a key-bearing artifact; only `verify_two_factor`
//! does, and only after a valid code.

use axum::{Extension, Json, http::StatusCode, response::Response};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::state::AuthState;
use super::storage;
use super::types::{LoginRequest, LoginResponse, VerifyTwoFactorRequest};
use crate::api::handlers::message;
use crate::auth::machine::{self, AuthError, LoginOutcome};
use crate::auth::token::Error as TokenError;

#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Password accepted; see response flags", body = LoginResponse),
        (status = 401, description = "Invalid username or password")
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(auth): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, Response> {
    let account = storage::find_by_username(&pool, payload.username.trim())
        .await
        .map_err(|err| {
            error!("looking up account: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "login failed")
        })?;

    let outcome = machine::login(
        account.as_ref(),
        &payload.password,
        auth.signer(),
        auth.config(),
    )
    .map_err(|err| match err {
        AuthError::InvalidCredentials => {
            message(StatusCode::UNAUTHORIZED, "invalid username or password")
        }
        other => {
            error!("login transition: {other}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "login failed")
        }
    })?;

    // The machine only succeeds when the account exists.
    let account = account.ok_or_else(|| {
        error!("login outcome without an account row");
        message(StatusCode::INTERNAL_SERVER_ERROR, "login failed")
    })?;

    let response = match outcome {
        LoginOutcome::SetupRequired { token } => {
            info!(account_id = %account.id, "login accepted, 2FA enrollment required");
            LoginResponse {
                message: "two-factor enrollment required".to_string(),
                token: Some(token),
                requires_2fa_setup: Some(true),
                account: Some(account.public()),
                ..LoginResponse::default()
            }
        }
        LoginOutcome::PendingTwoFactor { token } => {
            info!(account_id = %account.id, "login accepted, 2FA code pending");
            LoginResponse {
                message: "two-factor code required".to_string(),
                temp_token: Some(token),
                requires_2fa: Some(true),
                ..LoginResponse::default()
            }
        }
    };

    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/v1/auth/2fa/verify",
    request_body = VerifyTwoFactorRequest,
    responses(
        (status = 200, description = "Full session issued", body = LoginResponse),
        (status = 401, description = "Invalid artifact or code")
    ),
    tag = "auth"
)]
pub async fn verify_two_factor(
    Extension(auth): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<VerifyTwoFactorRequest>,
) -> Result<Json<LoginResponse>, Response> {
    let claims = auth.signer().validate(&payload.temp_token).map_err(|err| {
        let text = match err {
            TokenError::Expired => "verification window expired, please log in again",
            _ => "invalid session artifact",
        };
        message(StatusCode::UNAUTHORIZED, text)
    })?;

    let account = storage::find_by_id(&pool, claims.sub)
        .await
        .map_err(|err| {
            error!("looking up account: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "verification failed")
        })?
        .ok_or_else(|| message(StatusCode::UNAUTHORIZED, "invalid session artifact"))?;

    let session = machine::verify_two_factor(
        &claims,
        &account,
        payload.code.trim(),
        auth.signer(),
        auth.config(),
    )
    .map_err(|err| match err {
        AuthError::TotpMismatch => {
            warn!(account_id = %account.id, "2FA code mismatch");
            message(StatusCode::UNAUTHORIZED, "invalid two-factor code")
        }
        AuthError::InvalidArtifact | AuthError::NotEnrolled => {
            message(StatusCode::UNAUTHORIZED, "invalid session artifact")
        }
        other => {
            error!("2FA verification: {other}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "verification failed")
        }
    })?;

    info!(account_id = %account.id, "full session issued");

    Ok(Json(LoginResponse {
        message: "login successful".to_string(),
        token: Some(session),
        account: Some(account.public()),
        ..LoginResponse::default()
    }))
}

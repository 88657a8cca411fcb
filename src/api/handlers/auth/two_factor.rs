//! Two-factor enrollment lifecycle: stage a secret, prove possession to
//! trust it, and tear it down again with a fresh proof.

use axum::{Extension, Json, http::StatusCode, response::Response};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::session::SessionContext;
use super::state::AuthState;
use super::storage;
use super::types::{
    DisableTwoFactorRequest, EnableTwoFactorRequest, EnableTwoFactorResponse,
    TwoFactorSetupResponse,
};
use crate::api::handlers::message;
use crate::auth::account::Account;
use crate::auth::keys::derive_key;
use crate::auth::password::verify_password;
use crate::auth::token::Claims;
use crate::totp;

async fn load_account(pool: &PgPool, session: &SessionContext) -> Result<Account, Response> {
    storage::find_by_id(pool, session.account_id)
        .await
        .map_err(|err| {
            error!("looking up account: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "request failed")
        })?
        .ok_or_else(|| message(StatusCode::UNAUTHORIZED, "invalid session artifact"))
}

#[utoipa::path(
    post,
    path = "/v1/auth/2fa/setup",
    responses(
        (status = 200, description = "Secret staged for enrollment", body = TwoFactorSetupResponse),
        (status = 401, description = "Missing or out-of-scope artifact")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn setup(
    session: SessionContext,
    Extension(auth): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
) -> Result<Json<TwoFactorSetupResponse>, Response> {
    session.require_enrollment_scope()?;
    let account = load_account(&pool, &session).await?;

    let (secret, uri) = totp::generate(auth.config().issuer(), &account.username).map_err(|err| {
        error!("generating TOTP secret: {err}");
        message(StatusCode::INTERNAL_SERVER_ERROR, "2FA setup failed")
    })?;

    storage::set_pending_totp_secret(&pool, account.id, &secret)
        .await
        .map_err(|err| {
            error!("staging TOTP secret: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "2FA setup failed")
        })?;

    info!(account_id = %account.id, "TOTP secret staged");

    Ok(Json(TwoFactorSetupResponse {
        message: "scan the secret and confirm with a code".to_string(),
        secret,
        uri,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/2fa/enable",
    request_body = EnableTwoFactorRequest,
    responses(
        (status = 200, description = "Enrollment confirmed", body = EnableTwoFactorResponse),
        (status = 400, description = "No staged secret"),
        (status = 401, description = "Wrong code or out-of-scope artifact")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn enable(
    session: SessionContext,
    Extension(auth): Extension<Arc<AuthState>>,
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<EnableTwoFactorRequest>,
) -> Result<Json<EnableTwoFactorResponse>, Response> {
    session.require_enrollment_scope()?;
    let account = load_account(&pool, &session).await?;

    let Some(secret) = account.pending_totp_secret.as_deref() else {
        return Err(message(
            StatusCode::BAD_REQUEST,
            "no staged secret, call setup first",
        ));
    };

    let accepted = totp::verify_code(secret, payload.code.trim()).map_err(|err| {
        error!("verifying TOTP code: {err}");
        message(StatusCode::INTERNAL_SERVER_ERROR, "enabling 2FA failed")
    })?;
    if !accepted {
        warn!(account_id = %account.id, "2FA enrollment code mismatch");
        return Err(message(StatusCode::UNAUTHORIZED, "invalid two-factor code"));
    }

    storage::enable_totp(&pool, account.id).await.map_err(|err| {
        error!("enabling TOTP: {err}");
        message(StatusCode::INTERNAL_SERVER_ERROR, "enabling 2FA failed")
    })?;

    info!(account_id = %account.id, "2FA enabled");

    // Optional password lets enrollment flow straight into a full session
    // without a second login round trip.
    let mut token = None;
    if let Some(password) = payload.password.as_deref() {
        if verify_password(password, &account.password_verifier) {
            let key = derive_key(password, &account.salt);
            let claims = Claims::session(
                account.id,
                key.to_hex(),
                auth.config().session_ttl_seconds(),
            );
            token = Some(auth.signer().sign(&claims).map_err(|err| {
                error!("signing session artifact: {err}");
                message(StatusCode::INTERNAL_SERVER_ERROR, "enabling 2FA failed")
            })?);
        } else {
            warn!(account_id = %account.id, "auto-login password mismatch after enrollment");
        }
    }

    let auto_login = token.is_some();
    Ok(Json(EnableTwoFactorResponse {
        message: if auto_login {
            "two-factor authentication enabled, session issued".to_string()
        } else {
            "two-factor authentication enabled, please log in".to_string()
        },
        auto_login,
        token,
    }))
}

#[utoipa::path(
    post,
    path = "/v1/auth/2fa/disable",
    request_body = DisableTwoFactorRequest,
    responses(
        (status = 200, description = "Enrollment removed"),
        (status = 400, description = "Not enrolled"),
        (status = 401, description = "Wrong code or not a full session")
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn disable(
    session: SessionContext,
    Extension(pool): Extension<PgPool>,
    Json(payload): Json<DisableTwoFactorRequest>,
) -> Result<Response, Response> {
    session.require_full()?;
    let account = load_account(&pool, &session).await?;

    let Some(secret) = account
        .totp_secret
        .as_deref()
        .filter(|_| account.totp_enabled)
    else {
        return Err(message(
            StatusCode::BAD_REQUEST,
            "two-factor authentication is not enabled",
        ));
    };

    let accepted = totp::verify_code(secret, payload.code.trim()).map_err(|err| {
        error!("verifying TOTP code: {err}");
        message(StatusCode::INTERNAL_SERVER_ERROR, "disabling 2FA failed")
    })?;
    if !accepted {
        warn!(account_id = %account.id, "2FA disable code mismatch");
        return Err(message(StatusCode::UNAUTHORIZED, "invalid two-factor code"));
    }

    storage::disable_totp(&pool, account.id).await.map_err(|err| {
        error!("disabling TOTP: {err}");
        message(StatusCode::INTERNAL_SERVER_ERROR, "disabling 2FA failed")
    })?;

    info!(account_id = %account.id, "2FA disabled");

    Ok(message(
        StatusCode::OK,
        "two-factor authentication disabled",
    ))
}

//! Bearer-artifact validation and the per-request session context.
//!
//! The extractor parses and validates the artifact once; handlers receive a
//! typed [`SessionContext`] instead of re-validating tokens ad hoc. The
//! master key exists only inside this value for the lifetime of the request.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION, request::Parts},
    response::Response,
};
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;

use super::state::AuthState;
use crate::api::handlers::message;
use crate::auth::{
    keys::MasterKey,
    token::{Claims, Error as TokenError, Purpose},
};

/// Validated identity and capabilities of the current request.
#[derive(Clone)]
pub struct SessionContext {
    pub account_id: Uuid,
    pub purpose: Option<Purpose>,
    key: Option<MasterKey>,
}

impl SessionContext {
    pub(crate) fn from_claims(claims: &Claims) -> Result<Self, TokenError> {
        let key = match claims.key.as_deref() {
            Some(material) => {
                Some(MasterKey::from_hex(material).map_err(|_| TokenError::TokenFormat)?)
            }
            None => None,
        };
        Ok(Self {
            account_id: claims.sub,
            purpose: claims.purpose,
            key,
        })
    }

    /// Master key for envelope operations; present on full sessions only.
    pub(crate) fn key(&self) -> Option<&MasterKey> {
        self.key.as_ref()
    }

    /// Require a decrypt-capable session.
    pub(crate) fn require_key(&self) -> Result<&MasterKey, Response> {
        self.key().ok_or_else(|| {
            message(
                StatusCode::UNAUTHORIZED,
                "missing master key, please log in again",
            )
        })
    }

    /// Require a full session (no purpose restriction).
    pub(crate) fn require_full(&self) -> Result<(), Response> {
        if self.purpose.is_none() {
            Ok(())
        } else {
            Err(message(
                StatusCode::UNAUTHORIZED,
                "invalid session artifact for this operation",
            ))
        }
    }

    /// Enrollment endpoints accept full sessions and setup-required
    /// artifacts; pending-2FA artifacts are scoped to verification only.
    pub(crate) fn require_enrollment_scope(&self) -> Result<(), Response> {
        match self.purpose {
            None | Some(Purpose::SetupRequired) => Ok(()),
            Some(Purpose::Pending2fa) => Err(message(
                StatusCode::UNAUTHORIZED,
                "invalid session artifact for this operation",
            )),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth_state) = parts.extensions.get::<Arc<AuthState>>() else {
            error!("AuthState extension missing");
            return Err(message(
                StatusCode::INTERNAL_SERVER_ERROR,
                "server misconfigured",
            ));
        };

        let Some(token) = extract_bearer_token(&parts.headers) else {
            return Err(message(StatusCode::UNAUTHORIZED, "missing bearer token"));
        };

        let claims = auth_state.signer().validate(&token).map_err(|err| {
            let text = match err {
                TokenError::Expired => "session artifact expired",
                _ => "invalid session artifact",
            };
            message(StatusCode::UNAUTHORIZED, text)
        })?;

        Self::from_claims(&claims)
            .map_err(|_| message(StatusCode::UNAUTHORIZED, "invalid session artifact"))
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

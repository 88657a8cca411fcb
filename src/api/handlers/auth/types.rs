//! Request/response types for auth endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::account::PublicAccount;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
    pub account: PublicAccount,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login/verify response mirroring the three state-machine paths. Exactly
/// one of `token`/`temp_token` is present on success; neither on 401.
#[derive(ToSchema, Serialize, Debug, Default)]
pub struct LoginResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_2fa: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires_2fa_setup: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<PublicAccount>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyTwoFactorRequest {
    pub temp_token: String,
    pub code: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct TwoFactorSetupResponse {
    pub message: String,
    pub secret: String,
    /// `otpauth://totp/...` provisioning URI; QR rendering is up to the
    /// client.
    pub uri: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct EnableTwoFactorRequest {
    pub code: String,
    /// When present (and correct), the response auto-logs the caller in
    /// with a full session.
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct EnableTwoFactorResponse {
    pub message: String,
    pub auto_login: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct DisableTwoFactorRequest {
    pub code: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ProfileResponse {
    pub account: PublicAccount,
}

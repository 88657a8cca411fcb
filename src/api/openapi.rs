//! OpenAPI document served at `/api-docs/openapi.json`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api::handlers::{auth, health, secrets};
use crate::auth::account::PublicAccount;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::register::register,
        auth::login::login,
        auth::login::verify_two_factor,
        auth::two_factor::setup,
        auth::two_factor::enable,
        auth::two_factor::disable,
        auth::profile::profile,
        auth::profile::change_password,
        secrets::list,
        secrets::fetch,
        secrets::create,
        secrets::update,
        secrets::remove,
        secrets::categories,
    ),
    components(schemas(
        PublicAccount,
        auth::types::RegisterRequest,
        auth::types::RegisterResponse,
        auth::types::LoginRequest,
        auth::types::LoginResponse,
        auth::types::VerifyTwoFactorRequest,
        auth::types::TwoFactorSetupResponse,
        auth::types::EnableTwoFactorRequest,
        auth::types::EnableTwoFactorResponse,
        auth::types::DisableTwoFactorRequest,
        auth::types::ChangePasswordRequest,
        auth::types::ProfileResponse,
        secrets::types::CreateSecretRequest,
        secrets::types::UpdateSecretRequest,
        secrets::types::SecretEntry,
        secrets::types::SecretListResponse,
        secrets::types::CategoriesResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Registration, login, and two-factor lifecycle"),
        (name = "secrets", description = "Encrypted secret records")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("opaque")
                        .build(),
                ),
            );
        }
    }
}

//! Login state machine.
//!
//! Three paths out of an unauthenticated login: setup-required (no second
//! factor enrolled yet), pending-2FA (enrolled, code outstanding), or a
//! credential failure. The only state that ever yields a key-bearing
//! artifact is a completed two-factor verification; an account without 2FA
//! can never reach it.
//!
//! These functions are pure over an [`Account`] snapshot: handlers fetch and
//! persist around them, so the machine itself needs no storage access and no
//! shared state.

use thiserror::Error;

use crate::auth::account::Account;
use crate::auth::config::AuthConfig;
use crate::auth::keys::derive_key;
use crate::auth::password::{verify_dummy, verify_password};
use crate::auth::token::{self, Claims, Purpose, TokenSigner};
use crate::totp::{self, TotpError};

#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown username or wrong password. One error for both so a response
    /// never reveals whether the username exists.
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("invalid or expired session artifact")]
    InvalidArtifact,
    #[error("two-factor code mismatch")]
    TotpMismatch,
    #[error("two-factor authentication is not enrolled")]
    NotEnrolled,
    #[error(transparent)]
    Token(#[from] token::Error),
    #[error(transparent)]
    Totp(#[from] TotpError),
}

/// Outcome of a successful password check. Neither variant carries the
/// master key.
#[derive(Debug)]
pub enum LoginOutcome {
    /// No second factor enrolled: mandatory enrollment before any
    /// key-bearing artifact exists.
    SetupRequired { token: String },
    /// Second factor enrolled: a code must be verified before the key is
    /// derived.
    PendingTwoFactor { token: String },
}

/// Run the login transition for a username lookup result and submitted
/// password.
///
/// # Errors
/// `InvalidCredentials` when the account is missing or the verifier does not
/// match; token errors if artifact signing fails.
pub fn login(
    account: Option<&Account>,
    password: &str,
    signer: &TokenSigner,
    config: &AuthConfig,
) -> Result<LoginOutcome, AuthError> {
    let Some(account) = account else {
        // Same verification work as the found-account path.
        verify_dummy(password);
        return Err(AuthError::InvalidCredentials);
    };

    if !verify_password(password, &account.password_verifier) {
        return Err(AuthError::InvalidCredentials);
    }

    if account.totp_enabled && account.totp_secret.is_some() {
        let claims = Claims::pending_two_factor(
            account.id,
            password.to_string(),
            config.pending_ttl_seconds(),
        );
        let token = signer.sign(&claims)?;
        Ok(LoginOutcome::PendingTwoFactor { token })
    } else {
        let claims = Claims::setup_required(account.id, config.setup_ttl_seconds());
        let token = signer.sign(&claims)?;
        Ok(LoginOutcome::SetupRequired { token })
    }
}

/// Complete the pending-2FA transition: check the code, derive the key from
/// the password claim and the account salt, and issue the full session
/// artifact.
///
/// The password claim is consumed here and must not be reused or logged
/// afterwards.
///
/// # Errors
/// `InvalidArtifact` for a wrong purpose, subject mismatch, or missing
/// password claim; `NotEnrolled` if the account has no trusted secret;
/// `TotpMismatch` on a wrong code.
pub fn verify_two_factor(
    claims: &Claims,
    account: &Account,
    code: &str,
    signer: &TokenSigner,
    config: &AuthConfig,
) -> Result<String, AuthError> {
    if claims.purpose != Some(Purpose::Pending2fa) || claims.sub != account.id {
        return Err(AuthError::InvalidArtifact);
    }
    let password = claims
        .password
        .as_deref()
        .ok_or(AuthError::InvalidArtifact)?;

    let secret = account
        .totp_secret
        .as_deref()
        .filter(|_| account.totp_enabled)
        .ok_or(AuthError::NotEnrolled)?;

    if !totp::verify_code(secret, code)? {
        return Err(AuthError::TotpMismatch);
    }

    let key = derive_key(password, &account.salt);
    let session = Claims::session(account.id, key.to_hex(), config.session_ttl_seconds());
    Ok(signer.sign(&session)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::keys::{MasterKey, generate_salt};
    use crate::auth::password::hash_password;
    use anyhow::{Context, Result};
    use chrono::Utc;
    use secrecy::SecretString;
    use totp_rs::{Algorithm, Secret, TOTP};
    use uuid::Uuid;

    const PASSWORD: &str = "Passw0rd!";

    fn signer() -> TokenSigner {
        TokenSigner::new(&SecretString::from("machine-test-secret".to_string()))
    }

    fn config() -> AuthConfig {
        AuthConfig::new("http://localhost:5173".to_string())
    }

    fn account() -> Result<Account> {
        Ok(Account {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            password_verifier: hash_password(PASSWORD)?,
            salt: generate_salt(),
            totp_secret: None,
            totp_enabled: false,
            pending_totp_secret: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    fn enrolled_account() -> Result<(Account, String)> {
        let mut account = account()?;
        let (secret, _) = totp::generate("cofre", &account.username)?;
        account.totp_secret = Some(secret.clone());
        account.totp_enabled = true;
        Ok((account, secret))
    }

    fn current_code(secret_base32: &str) -> Result<String> {
        let bytes = Secret::Encoded(secret_base32.to_string())
            .to_bytes()
            .map_err(|err| anyhow::anyhow!("secret decode: {err:?}"))?;
        let totp = TOTP::new(Algorithm::SHA1, 6, 1, 30, bytes, None, "account".to_string())
            .map_err(|err| anyhow::anyhow!("totp init: {err}"))?;
        totp.generate_current().context("generate code")
    }

    #[test]
    fn unknown_username_is_invalid_credentials() {
        assert!(matches!(
            login(None, PASSWORD, &signer(), &config()),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn wrong_password_is_invalid_credentials() -> Result<()> {
        let account = account()?;
        assert!(matches!(
            login(Some(&account), "wrong-password", &signer(), &config()),
            Err(AuthError::InvalidCredentials)
        ));
        Ok(())
    }

    #[test]
    fn unenrolled_login_requires_setup_and_bears_no_key() -> Result<()> {
        let account = account()?;
        let outcome = login(Some(&account), PASSWORD, &signer(), &config())?;
        let LoginOutcome::SetupRequired { token } = outcome else {
            anyhow::bail!("expected setup-required outcome");
        };
        let claims = signer().validate(&token)?;
        assert_eq!(claims.purpose, Some(Purpose::SetupRequired));
        assert_eq!(claims.sub, account.id);
        assert!(claims.key.is_none());
        assert!(claims.password.is_none());
        Ok(())
    }

    #[test]
    fn enrolled_login_is_pending_with_password_claim() -> Result<()> {
        let (account, _) = enrolled_account()?;
        let outcome = login(Some(&account), PASSWORD, &signer(), &config())?;
        let LoginOutcome::PendingTwoFactor { token } = outcome else {
            anyhow::bail!("expected pending outcome");
        };
        let claims = signer().validate(&token)?;
        assert_eq!(claims.purpose, Some(Purpose::Pending2fa));
        assert_eq!(claims.password.as_deref(), Some(PASSWORD));
        assert!(claims.key.is_none());
        Ok(())
    }

    #[test]
    fn verification_issues_the_key_bearing_session() -> Result<()> {
        let (account, secret) = enrolled_account()?;
        let claims = Claims::pending_two_factor(
            account.id,
            PASSWORD.to_string(),
            config().pending_ttl_seconds(),
        );
        let session = verify_two_factor(
            &claims,
            &account,
            &current_code(&secret)?,
            &signer(),
            &config(),
        )?;

        let session_claims = signer().validate(&session)?;
        assert!(session_claims.purpose.is_none());
        assert!(session_claims.password.is_none());
        let key_hex = session_claims.key.context("session must carry the key")?;
        let expected = derive_key(PASSWORD, &account.salt);
        assert_eq!(MasterKey::from_hex(&key_hex)?, expected);
        Ok(())
    }

    #[test]
    fn wrong_code_is_a_totp_mismatch() -> Result<()> {
        let (account, secret) = enrolled_account()?;
        let claims = Claims::pending_two_factor(account.id, PASSWORD.to_string(), 300);
        let code = current_code(&secret)?;
        let wrong = if code == "000000" { "000001" } else { "000000" };
        assert!(matches!(
            verify_two_factor(&claims, &account, wrong, &signer(), &config()),
            Err(AuthError::TotpMismatch)
        ));
        Ok(())
    }

    #[test]
    fn setup_artifact_cannot_verify_a_second_factor() -> Result<()> {
        let (account, secret) = enrolled_account()?;
        let claims = Claims::setup_required(account.id, 3600);
        assert!(matches!(
            verify_two_factor(
                &claims,
                &account,
                &current_code(&secret)?,
                &signer(),
                &config()
            ),
            Err(AuthError::InvalidArtifact)
        ));
        Ok(())
    }

    #[test]
    fn subject_mismatch_is_an_invalid_artifact() -> Result<()> {
        let (account, secret) = enrolled_account()?;
        let claims = Claims::pending_two_factor(Uuid::new_v4(), PASSWORD.to_string(), 300);
        assert!(matches!(
            verify_two_factor(
                &claims,
                &account,
                &current_code(&secret)?,
                &signer(),
                &config()
            ),
            Err(AuthError::InvalidArtifact)
        ));
        Ok(())
    }

    #[test]
    fn pending_secret_alone_does_not_count_as_enrolled() -> Result<()> {
        let mut account = account()?;
        let (secret, _) = totp::generate("cofre", &account.username)?;
        account.pending_totp_secret = Some(secret.clone());
        // Staged only: login stays on the setup path.
        let outcome = login(Some(&account), PASSWORD, &signer(), &config())?;
        assert!(matches!(outcome, LoginOutcome::SetupRequired { .. }));

        let claims = Claims::pending_two_factor(account.id, PASSWORD.to_string(), 300);
        assert!(matches!(
            verify_two_factor(
                &claims,
                &account,
                &current_code(&secret)?,
                &signer(),
                &config()
            ),
            Err(AuthError::NotEnrolled)
        ));
        Ok(())
    }

    #[test]
    fn staged_reenrollment_keeps_the_trusted_factor() -> Result<()> {
        // An enrolled account that starts setting up a replacement secret
        // keeps logging in with the old one until the new one is confirmed.
        let (mut account, trusted) = enrolled_account()?;
        let (staged, _) = totp::generate("cofre", &account.username)?;
        account.pending_totp_secret = Some(staged.clone());

        let outcome = login(Some(&account), PASSWORD, &signer(), &config())?;
        assert!(matches!(outcome, LoginOutcome::PendingTwoFactor { .. }));

        let claims = Claims::pending_two_factor(account.id, PASSWORD.to_string(), 300);
        let session = verify_two_factor(
            &claims,
            &account,
            &current_code(&trusted)?,
            &signer(),
            &config(),
        )?;
        assert!(signer().validate(&session)?.key.is_some());

        // The staged secret is not trusted yet.
        assert!(matches!(
            verify_two_factor(
                &claims,
                &account,
                &current_code(&staged)?,
                &signer(),
                &config()
            ),
            Err(AuthError::TotpMismatch)
        ));
        Ok(())
    }
}

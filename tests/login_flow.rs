//! End-to-end walk of the authentication lifecycle over in-memory account
//! snapshots: registration material, mandatory enrollment, code
//! verification, and envelope access with the derived key.

use anyhow::{Context, Result};
use chrono::Utc;
use secrecy::SecretString;
use totp_rs::{Algorithm, Secret, TOTP};
use uuid::Uuid;

use cofre::auth::account::Account;
use cofre::auth::config::AuthConfig;
use cofre::auth::keys::{MasterKey, derive_key, generate_salt};
use cofre::auth::machine::{self, AuthError, LoginOutcome};
use cofre::auth::password::hash_password;
use cofre::auth::token::{Purpose, TokenSigner};
use cofre::envelope::{self, SecretFields};
use cofre::totp;

const PASSWORD: &str = "correct horse battery staple";

fn signer() -> TokenSigner {
    TokenSigner::new(&SecretString::from("integration-test-secret".to_string()))
}

fn config() -> AuthConfig {
    AuthConfig::new("http://localhost:5173".to_string())
}

fn register(username: &str) -> Result<Account> {
    Ok(Account {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        password_verifier: hash_password(PASSWORD)?,
        salt: generate_salt(),
        totp_secret: None,
        totp_enabled: false,
        pending_totp_secret: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    })
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
fn full_lifecycle_from_registration_to_vault_access() -> Result<()> {
    let signer = signer();
    let config = config();

    // Fresh account: the password is accepted but no key-bearing session
    // exists until enrollment completes.
    let mut alice = register("alice")?;
    let outcome = machine::login(Some(&alice), PASSWORD, &signer, &config)?;
    let LoginOutcome::SetupRequired { token } = outcome else {
        anyhow::bail!("fresh account must be routed to enrollment");
    };
    let setup_claims = signer.validate(&token)?;
    assert_eq!(setup_claims.purpose, Some(Purpose::SetupRequired));
    assert!(setup_claims.key.is_none());

    // Enroll: stage a secret, confirm with a live code, then promote it.
    let (secret, uri) = totp::generate(config.issuer(), &alice.username)?;
    assert!(uri.starts_with("otpauth://totp/"));
    alice.pending_totp_secret = Some(secret.clone());
    assert!(totp::verify_code(&secret, &current_code(&secret)?)?);
    alice.totp_secret = alice.pending_totp_secret.take();
    alice.totp_enabled = true;

    // Second login lands on the pending path.
    let outcome = machine::login(Some(&alice), PASSWORD, &signer, &config)?;
    let LoginOutcome::PendingTwoFactor { token } = outcome else {
        anyhow::bail!("enrolled account must be routed to code verification");
    };
    let pending_claims = signer.validate(&token)?;
    assert_eq!(pending_claims.purpose, Some(Purpose::Pending2fa));

    // A valid code completes the machine and yields the key-bearing session.
    let session = machine::verify_two_factor(
        &pending_claims,
        &alice,
        &current_code(&secret)?,
        &signer,
        &config,
    )?;
    let session_claims = signer.validate(&session)?;
    assert!(session_claims.purpose.is_none());
    let key_hex = session_claims.key.context("session must carry the key")?;
    let key = MasterKey::from_hex(&key_hex)?;
    assert_eq!(key, derive_key(PASSWORD, &alice.salt));

    // The derived key seals and opens vault records.
    let fields = SecretFields {
        title: "bank".to_string(),
        url: "https://bank.example".to_string(),
        username: "alice".to_string(),
        secret_value: "s3cr3t".to_string(),
        notes: String::new(),
    };
    let blob = envelope::seal(&fields, &key)?;
    assert_eq!(envelope::open(&blob, &key)?, fields);

    Ok(())
}

#[test]
fn wrong_password_is_rejected_on_both_paths() -> Result<()> {
    let signer = signer();
    let config = config();
    let mut alice = register("alice")?;

    assert!(matches!(
        machine::login(Some(&alice), "not the password", &signer, &config),
        Err(AuthError::InvalidCredentials)
    ));

    let (secret, _) = totp::generate(config.issuer(), &alice.username)?;
    alice.totp_secret = Some(secret);
    alice.totp_enabled = true;
    assert!(matches!(
        machine::login(Some(&alice), "not the password", &signer, &config),
        Err(AuthError::InvalidCredentials)
    ));
    Ok(())
}

#[test]
fn starting_reenrollment_does_not_weaken_login() -> Result<()> {
    let signer = signer();
    let config = config();
    let mut alice = register("alice")?;

    let (trusted, _) = totp::generate(config.issuer(), &alice.username)?;
    alice.totp_secret = Some(trusted.clone());
    alice.totp_enabled = true;

    // A fresh setup call stages a replacement without touching trust.
    let (staged, _) = totp::generate(config.issuer(), &alice.username)?;
    alice.pending_totp_secret = Some(staged);

    let outcome = machine::login(Some(&alice), PASSWORD, &signer, &config)?;
    let LoginOutcome::PendingTwoFactor { token } = outcome else {
        anyhow::bail!("enrolled account must still be routed to code verification");
    };

    let pending_claims = signer.validate(&token)?;
    let session = machine::verify_two_factor(
        &pending_claims,
        &alice,
        &current_code(&trusted)?,
        &signer,
        &config,
    )?;
    assert!(signer.validate(&session)?.key.is_some());
    Ok(())
}

#[test]
fn keys_from_different_accounts_cannot_read_each_other() -> Result<()> {
    let alice = register("alice")?;
    let bob = register("bob")?;

    // Same password, different salts: independent keys.
    let alice_key = derive_key(PASSWORD, &alice.salt);
    let bob_key = derive_key(PASSWORD, &bob.salt);
    assert_ne!(alice_key, bob_key);

    let fields = SecretFields {
        title: "mail".to_string(),
        secret_value: "hunter2".to_string(),
        ..SecretFields::default()
    };
    let blob = envelope::seal(&fields, &alice_key)?;
    assert!(envelope::open(&blob, &bob_key).is_err());
    Ok(())
}

#[test]
fn artifacts_from_a_different_signer_are_rejected() -> Result<()> {
    let config = config();
    let alice = register("alice")?;

    let outcome = machine::login(Some(&alice), PASSWORD, &signer(), &config)?;
    let LoginOutcome::SetupRequired { token } = outcome else {
        anyhow::bail!("expected setup-required outcome");
    };

    let other = TokenSigner::new(&SecretString::from("a different secret".to_string()));
    assert!(other.validate(&token).is_err());
    Ok(())
}

//! Time-based one-time password enrollment and verification.
//!
//! Codes are 6 digits over 30-second steps, SHA-1, with a skew of one step
//! either side to tolerate client clock drift. QR rendering of the
//! provisioning URI is left to the caller.

use thiserror::Error;
use totp_rs::{Algorithm, Secret, TOTP};

const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP_SECONDS: u64 = 30;

#[derive(Debug, Error)]
pub enum TotpError {
    #[error("invalid base32 secret")]
    InvalidSecret,
    #[error("totp setup error: {0}")]
    Setup(String),
    #[error("system clock error")]
    Clock,
}

/// Generate a fresh shared secret for an account.
///
/// Returns `(secret_base32, provisioning_uri)`; the URI embeds the issuer
/// and account label for authenticator apps
/// (`otpauth://totp/{issuer}:{account}?secret=...&issuer={issuer}`).
///
/// # Errors
/// Returns an error if secret generation or TOTP construction fails.
pub fn generate(issuer: &str, account: &str) -> Result<(String, String), TotpError> {
    let secret_bytes = Secret::generate_secret()
        .to_bytes()
        .map_err(|err| TotpError::Setup(err.to_string()))?;

    let totp = TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP_SECONDS,
        secret_bytes,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|err| TotpError::Setup(err.to_string()))?;

    Ok((totp.get_secret_base32(), totp.get_url()))
}

/// Verify a submitted code against a stored base32 secret, accepting the
/// current step and one adjacent step.
///
/// # Errors
/// Returns an error if the secret does not decode or the system clock is
/// unreadable.
pub fn verify_code(secret_base32: &str, code: &str) -> Result<bool, TotpError> {
    let totp = checker(secret_base32)?;
    totp.check_current(code).map_err(|_| TotpError::Clock)
}

fn checker(secret_base32: &str) -> Result<TOTP, TotpError> {
    let secret_bytes = Secret::Encoded(secret_base32.to_string())
        .to_bytes()
        .map_err(|_| TotpError::InvalidSecret)?;

    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP_SECONDS,
        secret_bytes,
        None,
        "account".to_string(), // label is irrelevant for verification
    )
    .map_err(|err| TotpError::Setup(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, Result};

    fn current_code(secret_base32: &str) -> Result<String> {
        let totp = checker(secret_base32).context("checker")?;
        totp.generate_current().context("generate code")
    }

    #[test]
    fn generated_secret_verifies_its_own_code() -> Result<()> {
        let (secret, _) = generate("cofre", "alice")?;
        let code = current_code(&secret)?;
        assert!(verify_code(&secret, &code)?);
        Ok(())
    }

    #[test]
    fn code_from_another_secret_fails() -> Result<()> {
        let (secret, _) = generate("cofre", "alice")?;
        let (other, _) = generate("cofre", "mallory")?;
        let code = current_code(&other)?;
        assert!(!verify_code(&secret, &code)?);
        Ok(())
    }

    #[test]
    fn adjacent_step_codes_are_within_tolerance() -> Result<()> {
        let (secret, _) = generate("cofre", "alice")?;
        let totp = checker(&secret)?;
        // Mid-step reference time so the window is unambiguous.
        let at = 1_700_000_015;
        assert!(totp.check(&totp.generate(at - 30), at));
        assert!(totp.check(&totp.generate(at + 30), at));
        assert!(!totp.check(&totp.generate(at - 60), at));
        assert!(!totp.check(&totp.generate(at + 60), at));
        Ok(())
    }

    #[test]
    fn previous_step_code_passes_verification() -> Result<()> {
        let (secret, _) = generate("cofre", "alice")?;
        let totp = checker(&secret)?;
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .context("clock")?
            .as_secs();
        assert!(verify_code(&secret, &totp.generate(now - STEP_SECONDS))?);
        Ok(())
    }

    #[test]
    fn wrong_code_fails() -> Result<()> {
        let (secret, _) = generate("cofre", "alice")?;
        let code = current_code(&secret)?;
        let wrong = if code == "000000" { "000001" } else { "000000" };
        assert!(!verify_code(&secret, wrong)?);
        Ok(())
    }

    #[test]
    fn provisioning_uri_embeds_issuer_and_secret() -> Result<()> {
        let (secret, uri) = generate("cofre", "alice")?;
        assert!(uri.starts_with("otpauth://totp/"));
        assert!(uri.contains("issuer=cofre"));
        assert!(uri.contains(&secret));
        Ok(())
    }

    #[test]
    fn secrets_are_unique() -> Result<()> {
        let (first, _) = generate("cofre", "alice")?;
        let (second, _) = generate("cofre", "alice")?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn invalid_secret_is_reported() {
        assert!(matches!(
            verify_code("not base32 at all!", "000000"),
            Err(TotpError::InvalidSecret)
        ));
    }
}

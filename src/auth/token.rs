//! Signed session artifacts.
//!
//! HS256 JWTs signed with a server-held secret. Claims are readable by
//! anyone holding the token; only the signature is protected. The `key` and
//! `password` claims therefore rely on transport confidentiality, a known
//! trade-off documented in DESIGN.md.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid token format")]
    TokenFormat,
    #[error("invalid base64url encoding")]
    Base64,
    #[error("invalid json")]
    Json(#[from] serde_json::Error),
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlg(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

/// Discriminant selecting what a non-full artifact is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Purpose {
    /// Identity only; valid for two-factor enrollment endpoints.
    SetupRequired,
    /// Identity plus the submitted password; valid for code verification
    /// only, on a short leash.
    Pending2fa,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
struct TokenHeader {
    alg: String,
    typ: String,
}

impl TokenHeader {
    fn hs256() -> Self {
        Self {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        }
    }
}

/// Claims carried by a session artifact. A full session has no `purpose`
/// and carries the hex master key; the key never appears in any other kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<Purpose>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Claims {
    /// Full session: key-bearing, decrypt-capable.
    #[must_use]
    pub fn session(sub: Uuid, key_hex: String, ttl_seconds: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub,
            exp: now + ttl_seconds,
            iat: now,
            purpose: None,
            key: Some(key_hex),
            password: None,
        }
    }

    /// Identity-only artifact scoped to two-factor enrollment.
    #[must_use]
    pub fn setup_required(sub: Uuid, ttl_seconds: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub,
            exp: now + ttl_seconds,
            iat: now,
            purpose: Some(Purpose::SetupRequired),
            key: None,
            password: None,
        }
    }

    /// Pending-2FA artifact. Carries the raw password so the key can be
    /// derived only after the second factor succeeds; the short TTL bounds
    /// its exposure window.
    #[must_use]
    pub fn pending_two_factor(sub: Uuid, password: String, ttl_seconds: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub,
            exp: now + ttl_seconds,
            iat: now,
            purpose: Some(Purpose::Pending2fa),
            key: None,
            password: Some(password),
        }
    }
}

fn b64e_json<T: Serialize>(value: &T) -> Result<String, Error> {
    let json = serde_json::to_vec(value)?;
    Ok(Base64UrlUnpadded::encode_string(&json))
}

fn b64d_json<T: for<'de> Deserialize<'de>>(segment: &str) -> Result<T, Error> {
    let bytes = Base64UrlUnpadded::decode_vec(segment).map_err(|_| Error::Base64)?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Issues and validates signed session artifacts. Pure function of the token
/// and the server secret; safe to share across workers.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        Self {
            secret: secret.expose_secret().as_bytes().to_vec(),
        }
    }

    /// Sign claims into a compact token.
    ///
    /// # Errors
    /// Returns an error if claims cannot be encoded or the secret is unusable
    /// as an HMAC key.
    pub fn sign(&self, claims: &Claims) -> Result<String, Error> {
        let header_b64 = b64e_json(&TokenHeader::hs256())?;
        let claims_b64 = b64e_json(claims)?;
        let signing_input = format!("{header_b64}.{claims_b64}");

        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| Error::InvalidSignature)?;
        mac.update(signing_input.as_bytes());
        let signature = Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// Validate signature and expiry, returning the claims.
    ///
    /// # Errors
    /// `TokenFormat`/`Base64`/`Json` for malformed input, `UnsupportedAlg`
    /// for a foreign header, `InvalidSignature` on MAC mismatch, and
    /// `Expired` once `exp` has passed (checked after the signature).
    pub fn validate(&self, token: &str) -> Result<Claims, Error> {
        let mut segments = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(Error::TokenFormat);
        };

        let header: TokenHeader = b64d_json(header_b64)?;
        if header.alg != "HS256" {
            return Err(Error::UnsupportedAlg(header.alg));
        }

        let signature = Base64UrlUnpadded::decode_vec(signature_b64).map_err(|_| Error::Base64)?;
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).map_err(|_| Error::InvalidSignature)?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        // Constant-time comparison via the Mac trait.
        mac.verify_slice(&signature)
            .map_err(|_| Error::InvalidSignature)?;

        let claims: Claims = b64d_json(claims_b64)?;
        if claims.exp <= Utc::now().timestamp() {
            return Err(Error::Expired);
        }

        Ok(claims)
    }
}

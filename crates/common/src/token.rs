//! Signed, timestamped tokens.
//!
//! A token is `base64url(claims) "." base64url(hmac)`, where the claims carry
//! the caller's data plus the issue time and lifetime. Every signer derives
//! its key from the server secret and a salt label, so a token issued for one
//! purpose (a password reset, a session) never verifies under another.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use sha2::Sha256;
use thiserror::Error;

use crate::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Salt label for password reset tokens.
pub const RESET_PASSWORD_SALT: &str = "reset-password";

/// Salt label for session tokens.
pub const SESSION_SALT: &str = "session";

/// Reasons a token fails verification.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("signature mismatch")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        Self::ExpiredOrInvalid
    }
}

#[derive(Serialize, Deserialize)]
struct Claims<T> {
    data: T,
    iat: i64,
    ttl: u64,
}

/// Issues and verifies tokens for a single salt label.
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl TokenSigner {
    /// Create a signer whose key is derived from `secret` and `salt`.
    #[must_use]
    pub fn new(secret: &str, salt: &str) -> Self {
        let mut mac = mac_for(secret.as_bytes());
        mac.update(b"inkwell.signer");
        mac.update(salt.as_bytes());
        Self {
            key: mac.finalize().into_bytes().to_vec(),
        }
    }

    /// Issue a token valid for `ttl_secs` from now.
    pub fn issue<T: Serialize>(&self, data: &T, ttl_secs: u64) -> Result<String, TokenError> {
        self.issue_at(data, ttl_secs, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_at<T: Serialize>(
        &self,
        data: &T,
        ttl_secs: u64,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            data,
            iat: now.timestamp(),
            ttl: ttl_secs,
        };
        let payload = serde_json::to_vec(&claims).map_err(|_| TokenError::Malformed)?;
        let payload = URL_SAFE_NO_PAD.encode(payload);

        let mut mac = mac_for(&self.key);
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token against the current time and return its data.
    pub fn verify<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    pub fn verify_at<T: DeserializeOwned>(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<T, TokenError> {
        let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Malformed)?;

        let mut mac = mac_for(&self.key);
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        let bytes = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| TokenError::Malformed)?;
        let claims: Claims<T> =
            serde_json::from_slice(&bytes).map_err(|_| TokenError::Malformed)?;

        let age = now.timestamp() - claims.iat;
        if age < 0 || age.unsigned_abs() > claims.ttl {
            return Err(TokenError::Expired);
        }

        Ok(claims.data)
    }
}

#[allow(clippy::expect_used)] // HMAC accepts any key size, this cannot fail
fn mac_for(key: &[u8]) -> HmacSha256 {
    HmacSha256::new_from_slice(key).expect("HMAC can take key of any size")
}

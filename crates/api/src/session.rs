//! Bearer session tokens.
//!
//! Sessions are stateless: the token carries the user id and is signed with
//! the server secret under its own salt, so a password reset token is never
//! accepted as a session and vice versa. Logging out means discarding the
//! token client-side.

use inkwell_common::{AppResult, TokenSigner, config::AuthConfig, token::SESSION_SALT};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct SessionClaims {
    user_id: i32,
}

/// A freshly issued session.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedSession {
    pub token: String,
    pub expires_in: u64,
}

/// Issues and resolves session tokens.
#[derive(Clone)]
pub struct SessionManager {
    signer: TokenSigner,
    ttl_secs: u64,
    remember_ttl_secs: u64,
}

impl SessionManager {
    /// Create a session manager from the auth settings.
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            signer: TokenSigner::new(&config.secret_key, SESSION_SALT),
            ttl_secs: config.session_ttl_secs,
            remember_ttl_secs: config.remember_ttl_secs,
        }
    }

    /// Issue a session for `user_id`. `remember` selects the long lifetime.
    pub fn issue(&self, user_id: i32, remember: bool) -> AppResult<IssuedSession> {
        let expires_in = if remember {
            self.remember_ttl_secs
        } else {
            self.ttl_secs
        };
        let token = self.signer.issue(&SessionClaims { user_id }, expires_in)?;
        Ok(IssuedSession { token, expires_in })
    }

    /// The user id a token was issued for, if it is valid and unexpired.
    #[must_use]
    pub fn resolve(&self, token: &str) -> Option<i32> {
        match self.signer.verify::<SessionClaims>(token) {
            Ok(claims) => Some(claims.user_id),
            Err(e) => {
                tracing::debug!(reason = %e, "Session token rejected");
                None
            }
        }
    }
}

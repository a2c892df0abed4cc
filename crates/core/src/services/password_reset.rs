//! Password reset by emailed, signed, time-limited token.

use chrono::{DateTime, Utc};
use inkwell_common::{AppError, AppResult, TokenSigner, token::RESET_PASSWORD_SALT};
use inkwell_db::{entities::user, repositories::UserRepository};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::email::{EmailMessage, MailerRef};
use super::user::hash_password;

/// Default reset token lifetime in seconds.
pub const DEFAULT_RESET_TTL_SECS: u64 = 1800;

/// Password reset service.
#[derive(Clone)]
pub struct PasswordResetService {
    user_repo: UserRepository,
    signer: TokenSigner,
    mailer: MailerRef,
    ttl_secs: u64,
}

#[derive(Serialize, Deserialize)]
struct ResetClaims {
    user_id: i32,
}

/// Input for requesting a reset email.
#[derive(Debug, Deserialize, Validate)]
pub struct ResetRequestInput {
    #[validate(email)]
    pub email: String,
}

/// Input for choosing a new password.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordInput {
    #[validate(length(min = 1, max = 128))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub confirm_password: String,
}

impl std::fmt::Debug for ResetPasswordInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetPasswordInput").finish_non_exhaustive()
    }
}

impl PasswordResetService {
    /// Create a new password reset service.
    #[must_use]
    pub fn new(user_repo: UserRepository, secret_key: &str, mailer: MailerRef, ttl_secs: u64) -> Self {
        Self {
            user_repo,
            signer: TokenSigner::new(secret_key, RESET_PASSWORD_SALT),
            mailer,
            ttl_secs,
        }
    }

    /// Issue a token for `identity` valid for `ttl_secs`.
    pub fn issue_reset_token(&self, identity: &user::Model, ttl_secs: u64) -> AppResult<String> {
        self.issue_reset_token_at(identity, ttl_secs, Utc::now())
    }

    /// Issue a token as if the current time were `now`.
    pub fn issue_reset_token_at(
        &self,
        identity: &user::Model,
        ttl_secs: u64,
        now: DateTime<Utc>,
    ) -> AppResult<String> {
        let claims = ResetClaims {
            user_id: identity.id,
        };
        Ok(self.signer.issue_at(&claims, ttl_secs, now)?)
    }

    /// Resolve a token to the user it was issued for.
    pub async fn verify_reset_token(&self, token: &str) -> AppResult<user::Model> {
        self.verify_reset_token_at(token, Utc::now()).await
    }

    /// Resolve a token as if the current time were `now`.
    ///
    /// Every failure, including a since-vanished user, is
    /// [`AppError::ExpiredOrInvalid`].
    pub async fn verify_reset_token_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> AppResult<user::Model> {
        let claims: ResetClaims = self.signer.verify_at(token, now).map_err(|e| {
            tracing::debug!(reason = %e, "Reset token rejected");
            AppError::ExpiredOrInvalid
        })?;

        self.user_repo
            .find_by_id(claims.user_id)
            .await?
            .ok_or(AppError::ExpiredOrInvalid)
    }

    /// Store a new password for `identity`.
    pub async fn apply_new_password(&self, identity: &user::Model, plaintext: &str) -> AppResult<()> {
        let password_hash = hash_password(plaintext)?;
        self.user_repo
            .update_password_hash(identity.id, password_hash)
            .await?;

        tracing::info!(user_id = identity.id, "Password reset");
        Ok(())
    }

    /// Email a reset link to the account registered under `input.email`.
    ///
    /// The link is `{link_base}/reset_password/{token}`. A mail failure is
    /// reported as [`AppError::DependencyFailure`]; the issued token stays
    /// valid until it expires.
    pub async fn request_reset(&self, input: ResetRequestInput, link_base: &str) -> AppResult<()> {
        input.validate()?;

        let identity = self
            .user_repo
            .find_by_email(&input.email)
            .await?
            .ok_or_else(|| {
                AppError::field(
                    "email",
                    "There is no account with that email. You must register first.",
                )
            })?;

        let token = self.issue_reset_token(&identity, self.ttl_secs)?;
        let link = format!("{}/reset_password/{token}", link_base.trim_end_matches('/'));

        self.mailer
            .send(EmailMessage {
                to: identity.email.clone(),
                subject: "Password Reset Request".to_string(),
                text_body: format!(
                    "To reset your password, visit the following link:\n{link}\n\n\
                     If you did not make this request then simply ignore this email \
                     and no changes will be made.\n"
                ),
            })
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, user_id = identity.id, "Reset email not delivered");
                match e {
                    AppError::DependencyFailure(_) => e,
                    other => AppError::DependencyFailure(other.to_string()),
                }
            })?;

        tracing::info!(user_id = identity.id, "Reset email sent");
        Ok(())
    }

    /// Verify `token` and set the new password.
    pub async fn reset_password(
        &self,
        token: &str,
        input: ResetPasswordInput,
    ) -> AppResult<user::Model> {
        let identity = self.verify_reset_token(token).await?;
        input.validate()?;
        self.apply_new_password(&identity, &input.password).await?;
        Ok(identity)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::email::MemoryMailer;
    use chrono::Duration;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn test_user(id: i32) -> user::Model {
        user::Model {
            id,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            image_ref: user::DEFAULT_IMAGE_REF.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    fn service(db: MockDatabase, mailer: MailerRef) -> PasswordResetService {
        let repo = UserRepository::new(Arc::new(db.into_connection()));
        PasswordResetService::new(repo, "secret", mailer, DEFAULT_RESET_TTL_SECS)
    }

    #[tokio::test]
    async fn test_token_round_trip_before_expiry() {
        let user = test_user(3);
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user.clone()]]),
            Arc::new(MemoryMailer::new()),
        );

        let now = Utc::now();
        let token = svc.issue_reset_token_at(&user, 1800, now).unwrap();
        let found = svc
            .verify_reset_token_at(&token, now + Duration::seconds(1000))
            .await
            .unwrap();
        assert_eq!(found.id, 3);
    }

    #[tokio::test]
    async fn test_token_expired_after_ttl() {
        let user = test_user(3);
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres),
            Arc::new(MemoryMailer::new()),
        );

        let now = Utc::now();
        let token = svc.issue_reset_token_at(&user, 1800, now).unwrap();
        let result = svc
            .verify_reset_token_at(&token, now + Duration::seconds(1801))
            .await;
        assert!(matches!(result, Err(AppError::ExpiredOrInvalid)));
    }

    #[tokio::test]
    async fn test_token_for_deleted_user_is_invalid() {
        let user = test_user(3);
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
            Arc::new(MemoryMailer::new()),
        );

        let token = svc.issue_reset_token(&user, 60).unwrap();
        assert!(matches!(
            svc.verify_reset_token(&token).await,
            Err(AppError::ExpiredOrInvalid)
        ));
    }

    #[tokio::test]
    async fn test_request_reset_sends_link() {
        let user = test_user(3);
        let mailer = Arc::new(MemoryMailer::new());
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user.clone()]]),
            mailer.clone(),
        );

        svc.request_reset(
            ResetRequestInput {
                email: "alice@example.com".to_string(),
            },
            "http://blog.test/",
        )
        .await
        .unwrap();

        let sent = mailer.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "alice@example.com");
        assert_eq!(sent[0].subject, "Password Reset Request");
        assert!(sent[0].text_body.contains("http://blog.test/reset_password/"));
    }

    #[tokio::test]
    async fn test_request_reset_unknown_email() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<user::Model>::new()]),
            Arc::new(MemoryMailer::new()),
        );

        let result = svc
            .request_reset(
                ResetRequestInput {
                    email: "ghost@example.com".to_string(),
                },
                "http://blog.test",
            )
            .await;
        assert!(matches!(
            &result,
            Err(AppError::InvalidInput(fields)) if fields.contains_key("email")
        ));
    }

    #[tokio::test]
    async fn test_request_reset_mail_failure() {
        let user = test_user(3);
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user.clone()]]),
            Arc::new(MemoryMailer::failing()),
        );

        let result = svc
            .request_reset(
                ResetRequestInput {
                    email: "alice@example.com".to_string(),
                },
                "http://blog.test",
            )
            .await;
        assert!(matches!(result, Err(AppError::DependencyFailure(_))));
    }

    #[tokio::test]
    async fn test_reset_password_updates_hash() {
        let user = test_user(3);
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }]),
            Arc::new(MemoryMailer::new()),
        );

        let token = svc.issue_reset_token(&user, 60).unwrap();
        let updated = svc
            .reset_password(
                &token,
                ResetPasswordInput {
                    password: "new-password".to_string(),
                    confirm_password: "new-password".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.id, 3);
    }
}

//! User service: registration, login, profile updates.

use std::fmt;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use inkwell_common::{AppError, AppResult};
use inkwell_db::{
    entities::user,
    repositories::{UserRepository, user::new_user},
};
use once_cell::sync::Lazy;
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::media::ImageStoreRef;

/// Hash checked against when the email is unknown, so both login failure
/// paths do the same work.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("inkwell-dummy-password").ok());

/// User service for business logic.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    image_store: ImageStoreRef,
}

/// Input for registering a new user.
#[derive(Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterInput {
    #[validate(length(min = 2, max = 20))]
    pub username: String,

    #[validate(email, length(max = 120))]
    pub email: String,

    #[validate(length(min = 1, max = 128))]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords must match."))]
    pub confirm_password: String,
}

impl fmt::Debug for RegisterInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterInput")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

/// Input for updating a profile. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileInput {
    #[validate(length(min = 2, max = 20))]
    pub username: Option<String>,

    #[validate(email, length(max = 120))]
    pub email: Option<String>,
}

/// An uploaded profile picture.
#[derive(Debug, Clone)]
pub struct ProfilePicture {
    /// Raw file contents.
    pub data: Vec<u8>,
    /// Client-supplied file name; only its extension is used.
    pub filename: String,
}

/// Public view of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i32,
    pub username: String,
    pub image_ref: String,
}

impl From<&user::Model> for UserSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            image_ref: user.image_ref.clone(),
        }
    }
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub fn new(user_repo: UserRepository, image_store: ImageStoreRef) -> Self {
        Self {
            user_repo,
            image_store,
        }
    }

    /// Register a new user.
    ///
    /// Uniqueness is decided by the database at insert time.
    pub async fn register(&self, input: RegisterInput) -> AppResult<user::Model> {
        input.validate()?;

        let password_hash = hash_password(&input.password)?;
        let user = self
            .user_repo
            .create(new_user(input.username, input.email, password_hash))
            .await?;

        tracing::info!(user_id = user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Check an email and password.
    ///
    /// Unknown email and wrong password both yield
    /// [`AppError::InvalidCredentials`].
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<user::Model> {
        let Some(user) = self.user_repo.find_by_email(email).await? else {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(password, dummy);
            }
            return Err(AppError::InvalidCredentials);
        };

        if verify_password(password, &user.password_hash)? {
            Ok(user)
        } else {
            tracing::debug!(user_id = user.id, "Password mismatch");
            Err(AppError::InvalidCredentials)
        }
    }

    /// Get a user by ID.
    pub async fn get(&self, id: i32) -> AppResult<user::Model> {
        self.user_repo.get_by_id(id).await
    }

    /// Get a user by exact username.
    pub async fn get_by_username(&self, username: &str) -> AppResult<user::Model> {
        self.user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {username}")))
    }

    /// Find a user by exact email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        self.user_repo.find_by_email(email).await
    }

    /// Update username, email, and/or profile picture.
    ///
    /// A new picture is stored first; if the row update then fails the
    /// stored file is removed again.
    pub async fn update_profile(
        &self,
        identity: &user::Model,
        input: UpdateProfileInput,
        picture: Option<ProfilePicture>,
    ) -> AppResult<user::Model> {
        input.validate()?;

        let image_ref = match picture {
            Some(picture) => Some(
                self.image_store
                    .store_profile_picture(picture.data, &picture.filename)
                    .await?,
            ),
            None => None,
        };

        let mut model: user::ActiveModel = identity.clone().into();
        let mut changed = false;
        if let Some(username) = input.username.filter(|u| *u != identity.username) {
            model.username = Set(username);
            changed = true;
        }
        if let Some(email) = input.email.filter(|e| *e != identity.email) {
            model.email = Set(email);
            changed = true;
        }
        if let Some(image_ref) = &image_ref {
            model.image_ref = Set(image_ref.clone());
            changed = true;
        }

        if !changed {
            return self.user_repo.get_by_id(identity.id).await;
        }

        match self.user_repo.update(model).await {
            Ok(user) => {
                tracing::info!(user_id = user.id, "Profile updated");
                Ok(user)
            }
            Err(e) => {
                if let Some(image_ref) = image_ref {
                    if let Err(cleanup) = self.image_store.remove(&image_ref).await {
                        tracing::warn!(error = %cleanup, image_ref = %image_ref, "Failed to remove orphaned picture");
                    }
                }
                Err(e)
            }
        }
    }
}

/// Hash a password with Argon2 and a random salt.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a hash.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AppError::Internal(format!("Invalid hash: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::media::ImageStore;
    use async_trait::async_trait;
    use inkwell_common::DuplicateField;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
    use std::sync::Arc;

    struct NoImages;

    #[async_trait]
    impl ImageStore for NoImages {
        async fn store_profile_picture(&self, _: Vec<u8>, _: &str) -> AppResult<String> {
            Ok("stored.png".to_string())
        }

        async fn remove(&self, _: &str) -> AppResult<()> {
            Ok(())
        }
    }

    fn create_test_user(id: i32, username: &str, password: &str) -> user::Model {
        user::Model {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            image_ref: user::DEFAULT_IMAGE_REF.to_string(),
            password_hash: hash_password(password).unwrap(),
        }
    }

    fn service(db: MockDatabase) -> UserService {
        let repo = UserRepository::new(Arc::new(db.into_connection()));
        UserService::new(repo, Arc::new(NoImages))
    }

    fn register_input(username: &str, email: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: email.to_string(),
            password: "password".to_string(),
            confirm_password: "password".to_string(),
        }
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert_ne!(hash, "correct horse");
        assert!(verify_password("correct horse", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }

    #[test]
    fn test_register_input_debug_hides_password() {
        let input = register_input("alice", "alice@example.com");
        assert!(!format!("{input:?}").contains("password"));
    }

    #[tokio::test]
    async fn test_register_success() {
        let created = create_test_user(1, "alice", "password");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[created.clone()]]),
        );

        let user = svc
            .register(register_input("alice", "alice@example.com"))
            .await
            .unwrap();
        assert_eq!(user.id, 1);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_errors([DbErr::Custom(
                "duplicate key value violates unique constraint \"idx_users_email\"".to_string(),
            )]),
        );

        let result = svc
            .register(register_input("alice", "alice@example.com"))
            .await;
        assert!(matches!(
            result,
            Err(AppError::Duplicate(DuplicateField::Email))
        ));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let svc = service(MockDatabase::new(DatabaseBackend::Postgres));

        for input in [
            register_input("a", "alice@example.com"),
            register_input("a_very_long_username_indeed", "alice@example.com"),
            register_input("alice", "not-an-email"),
            RegisterInput {
                confirm_password: "different".to_string(),
                ..register_input("alice", "alice@example.com")
            },
        ] {
            assert!(matches!(
                svc.register(input).await,
                Err(AppError::InvalidInput(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_authenticate_success() {
        let user = create_test_user(1, "alice", "password");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[user.clone()]]),
        );

        let authed = svc
            .authenticate("alice@example.com", "password")
            .await
            .unwrap();
        assert_eq!(authed.id, 1);
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let user = create_test_user(1, "alice", "password");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[user.clone()]])
                .append_query_results([Vec::<user::Model>::new()]),
        );

        let wrong_password = svc.authenticate("alice@example.com", "nope").await;
        let unknown_email = svc.authenticate("ghost@example.com", "password").await;

        let wrong_password = wrong_password.unwrap_err();
        let unknown_email = unknown_email.unwrap_err();
        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_update_profile_with_picture() {
        let user = create_test_user(1, "alice", "password");
        let updated = user::Model {
            image_ref: "stored.png".to_string(),
            ..user.clone()
        };
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[updated.clone()]]),
        );

        let result = svc
            .update_profile(
                &user,
                UpdateProfileInput::default(),
                Some(ProfilePicture {
                    data: vec![1, 2, 3],
                    filename: "me.png".to_string(),
                }),
            )
            .await
            .unwrap();
        assert_eq!(result.image_ref, "stored.png");
    }

    #[tokio::test]
    async fn test_update_profile_duplicate_username() {
        let user = create_test_user(1, "alice", "password");
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_errors([DbErr::Custom(
                "UNIQUE constraint failed: users.username".to_string(),
            )]),
        );

        let result = svc
            .update_profile(
                &user,
                UpdateProfileInput {
                    username: Some("bob".to_string()),
                    email: None,
                },
                None,
            )
            .await;
        assert!(matches!(
            result,
            Err(AppError::Duplicate(DuplicateField::Username))
        ));
    }
}

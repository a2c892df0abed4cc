//! User repository.

use std::sync::Arc;

use crate::constraint::duplicate_user_field;
use crate::entities::{User, user};
use inkwell_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
};

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {id}")))
    }

    /// Find a user by exact (case-sensitive) username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by exact (case-sensitive) email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    ///
    /// A username or email collision surfaces as [`AppError::Duplicate`].
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.insert(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model.update(self.db.as_ref()).await.map_err(map_write_err)
    }

    /// Replace the stored password hash.
    pub async fn update_password_hash(&self, id: i32, password_hash: String) -> AppResult<()> {
        let result = User::update_many()
            .col_expr(
                user::Column::PasswordHash,
                sea_orm::sea_query::Expr::value(password_hash),
            )
            .filter(user::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("User {id}")));
        }
        Ok(())
    }
}

fn map_write_err(err: DbErr) -> AppError {
    match duplicate_user_field(&err) {
        Some(field) => AppError::Duplicate(field),
        None => match err {
            DbErr::RecordNotUpdated => AppError::NotFound("User".to_string()),
            other => AppError::Database(other.to_string()),
        },
    }
}

/// Build an insertable user row.
#[must_use]
pub fn new_user(username: String, email: String, password_hash: String) -> user::ActiveModel {
    user::ActiveModel {
        username: Set(username),
        email: Set(email),
        image_ref: Set(user::DEFAULT_IMAGE_REF.to_string()),
        password_hash: Set(password_hash),
        ..Default::default()
    }
}

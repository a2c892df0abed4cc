//! Comment repository.

use std::sync::Arc;

use crate::constraint::is_foreign_key_violation;
use crate::entities::{Comment, User, comment, user};
use inkwell_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

/// A comment joined with its author.
pub type CommentWithOwner = (comment::Model, Option<user::Model>);

/// Comment repository for database operations.
#[derive(Clone)]
pub struct CommentRepository {
    db: Arc<DatabaseConnection>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Create a new comment.
    ///
    /// If the post vanished since it was loaded the foreign key rejects the
    /// row and this returns [`AppError::NotFound`].
    pub async fn create(&self, model: comment::ActiveModel) -> AppResult<comment::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::NotFound("Post".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })
    }

    /// Comments on a post with their authors, newest first.
    pub async fn find_by_post(&self, post_id: i32) -> AppResult<Vec<CommentWithOwner>> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_desc(comment::Column::CreatedAt)
            .order_by_desc(comment::Column::Id)
            .find_also_related(User)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count comments on a post.
    pub async fn count_by_post(&self, post_id: i32) -> AppResult<u64> {
        Comment::find()
            .filter(comment::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

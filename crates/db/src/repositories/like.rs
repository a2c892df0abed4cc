//! Like repository.

use std::sync::Arc;
use std::time::Duration;

use crate::constraint::{is_foreign_key_violation, is_lock_contention, is_unique_violation};
use crate::entities::{Like, Post, like};
use inkwell_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, Set, TransactionTrait,
};

/// Transactions a toggle may lose to lock contention before giving up.
const TOGGLE_ATTEMPTS: u32 = 5;

/// Pause before a retry, scaled by the attempt number.
const TOGGLE_BACKOFF: Duration = Duration::from_millis(10);

/// Like repository for database operations.
#[derive(Clone)]
pub struct LikeRepository {
    db: Arc<DatabaseConnection>,
}

impl LikeRepository {
    /// Create a new like repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find the like a user left on a post.
    pub async fn find_by_user_and_post(
        &self,
        user_id: i32,
        post_id: i32,
    ) -> AppResult<Option<like::Model>> {
        Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::PostId.eq(post_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Check if a user has liked a post.
    pub async fn has_liked(&self, user_id: i32, post_id: i32) -> AppResult<bool> {
        Ok(self
            .find_by_user_and_post(user_id, post_id)
            .await?
            .is_some())
    }

    /// Count likes on a post.
    pub async fn count_by_post(&self, post_id: i32) -> AppResult<u64> {
        Like::find()
            .filter(like::Column::PostId.eq(post_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Flip the (user, post) like and return whether it is now present.
    ///
    /// Read-then-write runs in one transaction. The unique index on
    /// `(user_id, post_id)` is authoritative: losing an insert race means a
    /// concurrent toggle already created the row, which reads as liked. A
    /// transaction that loses a lock race is retried; if it keeps losing,
    /// the state left by the competing toggles is reported.
    pub async fn toggle(&self, user_id: i32, post_id: i32) -> AppResult<bool> {
        for attempt in 1..=TOGGLE_ATTEMPTS {
            match self.toggle_once(user_id, post_id).await {
                Ok(Some(liked)) => return Ok(liked),
                Ok(None) => return Err(AppError::NotFound(format!("Post {post_id}"))),
                Err(e) if is_unique_violation(&e) => {
                    tracing::debug!(user_id, post_id, "Concurrent like won the insert");
                    return Ok(true);
                }
                Err(e) if is_foreign_key_violation(&e) => {
                    return Err(AppError::NotFound(format!("Post {post_id}")));
                }
                Err(e) if is_lock_contention(&e) => {
                    tracing::debug!(user_id, post_id, attempt, error = %e, "Like toggle contended");
                    tokio::time::sleep(TOGGLE_BACKOFF * attempt).await;
                }
                Err(e) => return Err(AppError::Database(e.to_string())),
            }
        }

        tracing::warn!(user_id, post_id, "Like toggle stayed contended");
        self.has_liked(user_id, post_id).await
    }

    /// One toggle transaction. `None` when the post does not exist.
    async fn toggle_once(&self, user_id: i32, post_id: i32) -> Result<Option<bool>, DbErr> {
        let txn = self.db.begin().await?;

        if Post::find_by_id(post_id).one(&txn).await?.is_none() {
            return Ok(None);
        }

        let existing = Like::find()
            .filter(like::Column::UserId.eq(user_id))
            .filter(like::Column::PostId.eq(post_id))
            .one(&txn)
            .await?;

        let liked = if let Some(existing) = existing {
            Like::delete_by_id(existing.id).exec(&txn).await?;
            false
        } else {
            like::ActiveModel {
                user_id: Set(user_id),
                post_id: Set(post_id),
                ..Default::default()
            }
            .insert(&txn)
            .await?;
            true
        };

        txn.commit().await?;
        Ok(Some(liked))
    }
}

//! Like service.

use inkwell_common::{AppError, AppResult};
use inkwell_db::repositories::{LikeRepository, PostRepository};
use serde::Serialize;

use super::authorization::{Action, Actor, can_mutate};

/// Like service for business logic.
#[derive(Clone)]
pub struct LikeService {
    like_repo: LikeRepository,
    post_repo: PostRepository,
}

/// Like state of a post after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeState {
    pub liked: bool,
    pub like_count: u64,
}

impl LikeService {
    /// Create a new like service.
    #[must_use]
    pub const fn new(like_repo: LikeRepository, post_repo: PostRepository) -> Self {
        Self {
            like_repo,
            post_repo,
        }
    }

    /// Like the post if `actor` has not yet, otherwise remove the like.
    pub async fn toggle(&self, actor: Actor, post_id: i32) -> AppResult<LikeState> {
        let post = self.post_repo.get_by_id(post_id).await?;
        can_mutate(actor, &post, Action::Like).into_result()?;
        let user_id = actor.user_id().ok_or(AppError::Unauthenticated)?;

        let liked = self.like_repo.toggle(user_id, post_id).await?;
        let like_count = self.like_repo.count_by_post(post_id).await?;

        tracing::info!(user_id, post_id, liked, "Like toggled");
        Ok(LikeState { liked, like_count })
    }

    /// Number of likes on a post.
    pub async fn count(&self, post_id: i32) -> AppResult<u64> {
        self.like_repo.count_by_post(post_id).await
    }

    /// Whether `actor` has liked the post. Always false when anonymous.
    pub async fn has_liked(&self, actor: Actor, post_id: i32) -> AppResult<bool> {
        match actor.user_id() {
            Some(user_id) => self.like_repo.has_liked(user_id, post_id).await,
            None => Ok(false),
        }
    }
}

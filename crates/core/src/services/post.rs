//! Post service.

use chrono::Utc;
use inkwell_common::{AppError, AppResult};
use inkwell_db::{
    entities::post,
    repositories::{CommentRepository, LikeRepository, PostRepository},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::authorization::{Action, Actor, can_author, can_mutate};
use super::comment::CommentView;
use super::user::UserSummary;

/// Post service for business logic.
#[derive(Clone)]
pub struct PostService {
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    like_repo: LikeRepository,
}

/// Input for creating or editing a post.
#[derive(Debug, Deserialize, Validate)]
pub struct PostInput {
    #[validate(
        custom(function = "crate::validation::not_blank"),
        length(max = 100)
    )]
    pub title: String,

    #[serde(alias = "content")]
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub body: String,
}

/// A post with its author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: post::Model,
    pub author: Option<UserSummary>,
}

/// Everything shown on a single post page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: PostView,
    pub comments: Vec<CommentView>,
    pub like_count: u64,
    pub liked: bool,
}

impl PostService {
    /// Create a new post service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        like_repo: LikeRepository,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            like_repo,
        }
    }

    /// Publish a new post owned by `actor`.
    pub async fn create(&self, actor: Actor, input: PostInput) -> AppResult<post::Model> {
        can_author(actor).into_result()?;
        let owner_id = actor.user_id().ok_or(AppError::Unauthenticated)?;
        input.validate()?;

        let model = post::ActiveModel {
            title: Set(input.title),
            body: Set(input.body),
            created_at: Set(Utc::now()),
            owner_id: Set(owner_id),
            ..Default::default()
        };
        let post = self.post_repo.create(model).await?;

        tracing::info!(post_id = post.id, owner_id, "Post created");
        Ok(post)
    }

    /// Get a post by ID.
    pub async fn get(&self, id: i32) -> AppResult<post::Model> {
        self.post_repo.get_by_id(id).await
    }

    /// Load a post with its author, comments and like state for `actor`.
    pub async fn detail(&self, actor: Actor, id: i32) -> AppResult<PostDetail> {
        let (post, owner) = self
            .post_repo
            .find_with_owner(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {id}")))?;

        let comments = self
            .comment_repo
            .find_by_post(id)
            .await?
            .into_iter()
            .map(CommentView::from)
            .collect();
        let like_count = self.like_repo.count_by_post(id).await?;
        let liked = match actor.user_id() {
            Some(user_id) => self.like_repo.has_liked(user_id, id).await?,
            None => false,
        };

        Ok(PostDetail {
            post: PostView {
                post,
                author: owner.as_ref().map(UserSummary::from),
            },
            comments,
            like_count,
            liked,
        })
    }

    /// Replace title and body. Only the owner may edit.
    pub async fn update(&self, actor: Actor, id: i32, input: PostInput) -> AppResult<post::Model> {
        let post = self.post_repo.get_by_id(id).await?;
        can_mutate(actor, &post, Action::Edit).into_result()?;
        input.validate()?;

        self.post_repo
            .update_content(id, input.title.clone(), input.body.clone())
            .await?;

        tracing::info!(post_id = id, "Post updated");
        Ok(post::Model {
            title: input.title,
            body: input.body,
            ..post
        })
    }

    /// Delete a post with its comments and likes. Only the owner may delete.
    pub async fn delete(&self, actor: Actor, id: i32) -> AppResult<()> {
        let post = self.post_repo.get_by_id(id).await?;
        can_mutate(actor, &post, Action::Delete).into_result()?;

        self.post_repo.delete_with_dependents(id).await?;

        tracing::info!(post_id = id, "Post deleted");
        Ok(())
    }
}

//! Comment service.

use chrono::Utc;
use inkwell_common::{AppError, AppResult};
use inkwell_db::{
    entities::comment,
    repositories::{CommentRepository, PostRepository, comment::CommentWithOwner},
};
use sea_orm::Set;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::authorization::{Action, Actor, can_mutate};
use super::user::UserSummary;

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    post_repo: PostRepository,
}

/// Input for adding a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct CommentInput {
    #[serde(alias = "content")]
    #[validate(custom(function = "crate::validation::not_blank"))]
    pub body: String,
}

/// A comment with its author.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub author: Option<UserSummary>,
}

impl From<CommentWithOwner> for CommentView {
    fn from((comment, owner): CommentWithOwner) -> Self {
        Self {
            comment,
            author: owner.as_ref().map(UserSummary::from),
        }
    }
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub const fn new(comment_repo: CommentRepository, post_repo: PostRepository) -> Self {
        Self {
            comment_repo,
            post_repo,
        }
    }

    /// Add a comment by `actor` to a post.
    pub async fn add(
        &self,
        actor: Actor,
        post_id: i32,
        input: CommentInput,
    ) -> AppResult<comment::Model> {
        let post = self.post_repo.get_by_id(post_id).await?;
        can_mutate(actor, &post, Action::Comment).into_result()?;
        let owner_id = actor.user_id().ok_or(AppError::Unauthenticated)?;
        input.validate()?;

        let model = comment::ActiveModel {
            body: Set(input.body),
            created_at: Set(Utc::now()),
            owner_id: Set(owner_id),
            post_id: Set(post_id),
            ..Default::default()
        };
        let comment = self.comment_repo.create(model).await?;

        tracing::info!(comment_id = comment.id, post_id, owner_id, "Comment added");
        Ok(comment)
    }

    /// Comments on a post, newest first.
    pub async fn list_for_post(&self, post_id: i32) -> AppResult<Vec<CommentView>> {
        Ok(self
            .comment_repo
            .find_by_post(post_id)
            .await?
            .into_iter()
            .map(CommentView::from)
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use inkwell_db::entities::post;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase};
    use std::sync::Arc;

    fn test_post(id: i32, owner_id: i32) -> post::Model {
        post::Model {
            id,
            title: "Title".to_string(),
            body: "Body".to_string(),
            created_at: Utc::now(),
            owner_id,
        }
    }

    fn service(db: DatabaseConnection) -> CommentService {
        let db = Arc::new(db);
        CommentService::new(CommentRepository::new(db.clone()), PostRepository::new(db))
    }

    fn input(body: &str) -> CommentInput {
        CommentInput {
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_by_any_user() {
        let created = comment::Model {
            id: 1,
            body: "Hello".to_string(),
            created_at: Utc::now(),
            owner_id: 2,
            post_id: 5,
        };
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post(5, 1)]])
                .append_query_results([[created.clone()]])
                .into_connection(),
        );

        let comment = svc.add(Actor::User(2), 5, input("Hello")).await.unwrap();
        assert_eq!(comment.owner_id, 2);
        assert_eq!(comment.post_id, 5);
    }

    #[tokio::test]
    async fn test_add_anonymous() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post(5, 1)]])
                .into_connection(),
        );

        assert!(matches!(
            svc.add(Actor::Anonymous, 5, input("Hello")).await,
            Err(AppError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_add_blank_body() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post(5, 1)]])
                .into_connection(),
        );

        assert!(matches!(
            svc.add(Actor::User(2), 5, input("  ")).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_add_to_post_deleted_meanwhile() {
        let svc = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[test_post(5, 1)]])
                .append_query_errors([DbErr::Custom(
                    "insert or update on table \"comments\" violates foreign key constraint"
                        .to_string(),
                )])
                .into_connection(),
        );

        assert!(matches!(
            svc.add(Actor::User(2), 5, input("Hello")).await,
            Err(AppError::NotFound(_))
        ));
    }
}

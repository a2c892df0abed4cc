//! Post repository.

use std::sync::Arc;

use crate::entities::{Comment, Like, Post, User, comment, like, post, user};
use inkwell_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, TransactionTrait, sea_query::Expr,
};

/// A post joined with its author.
pub type PostWithOwner = (post::Model, Option<user::Model>);

/// Post repository for database operations.
#[derive(Clone)]
pub struct PostRepository {
    db: Arc<DatabaseConnection>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: i32) -> AppResult<Option<post::Model>> {
        Post::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: i32) -> AppResult<post::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {id}")))
    }

    /// Find a post together with its author.
    pub async fn find_with_owner(&self, id: i32) -> AppResult<Option<PostWithOwner>> {
        Post::find_by_id(id)
            .find_also_related(User)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new post.
    pub async fn create(&self, model: post::ActiveModel) -> AppResult<post::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Overwrite title and body in one statement. `owner_id` is never touched.
    pub async fn update_content(&self, id: i32, title: String, body: String) -> AppResult<()> {
        let result = Post::update_many()
            .col_expr(post::Column::Title, Expr::value(title))
            .col_expr(post::Column::Body, Expr::value(body))
            .filter(post::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound(format!("Post {id}")));
        }
        Ok(())
    }

    /// Delete a post with its likes and comments in one transaction.
    pub async fn delete_with_dependents(&self, id: i32) -> AppResult<()> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Like::delete_many()
            .filter(like::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Comment::delete_many()
            .filter(comment::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let result = Post::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            // Dropping the transaction rolls it back.
            return Err(AppError::NotFound(format!("Post {id}")));
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count posts, optionally restricted to one owner.
    pub async fn count(&self, owner_id: Option<i32>) -> AppResult<u64> {
        filtered(owner_id)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// One window of the feed: newest first, ties broken by id.
    pub async fn find_page(
        &self,
        owner_id: Option<i32>,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<PostWithOwner>> {
        filtered(owner_id)
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .offset(offset)
            .limit(limit)
            .find_also_related(User)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

fn filtered(owner_id: Option<i32>) -> Select<Post> {
    let query = Post::find();
    match owner_id {
        Some(owner_id) => query.filter(post::Column::OwnerId.eq(owner_id)),
        None => query,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_post(id: i32, owner_id: i32) -> post::Model {
        post::Model {
            id,
            title: format!("Post {id}"),
            body: "Body".to_string(),
            created_at: Utc::now(),
            owner_id,
        }
    }

    #[tokio::test]
    async fn test_find_by_id_found() {
        let post = create_test_post(1, 10);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[post.clone()]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let found = repo.find_by_id(1).await.unwrap().unwrap();

        assert_eq!(found.owner_id, 10);
        assert_eq!(found.title, "Post 1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<post::Model>::new()])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(matches!(
            repo.get_by_id(5).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_update_content_missing_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        let result = repo
            .update_content(3, "t".to_string(), "b".to_string())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_with_dependents() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 2,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 1,
                    },
                ])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        repo.delete_with_dependents(7).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_with_dependents_missing_post() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                    MockExecResult {
                        last_insert_id: 0,
                        rows_affected: 0,
                    },
                ])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert!(matches!(
            repo.delete_with_dependents(7).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_count_posts() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(12)),
                }]])
                .into_connection(),
        );

        let repo = PostRepository::new(db);
        assert_eq!(repo.count(None).await.unwrap(), 12);
    }
}

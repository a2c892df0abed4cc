//! Database integration tests.
//!
//! The SQLite tests run everywhere. The `PostgreSQL` tests need a running
//! instance and are ignored by default.
//! Run with: `cargo test --test db_integration -- --ignored`
//!
//! Environment variables:
//!   `TEST_DB_HOST` (default: localhost)
//!   `TEST_DB_PORT` (default: 5433)
//!   `TEST_DB_USER` (default: `inkwell_test`)
//!   `TEST_DB_PASSWORD` (default: `inkwell_test`)
//!   `TEST_DB_NAME` (default: `inkwell_test`)

#![allow(clippy::unwrap_used)]

use chrono::{Duration, Utc};
use inkwell_common::{AppError, DuplicateField};
use inkwell_db::entities::{comment, post};
use inkwell_db::repositories::user::new_user;
use inkwell_db::repositories::{CommentRepository, LikeRepository, PostRepository, UserRepository};
use inkwell_db::test_utils::{TestDatabase, TestDbConfig};
use sea_orm::Set;

async fn seed_user(repo: &UserRepository, name: &str) -> i32 {
    repo.create(new_user(
        name.to_string(),
        format!("{name}@example.com"),
        "hash".to_string(),
    ))
    .await
    .unwrap()
    .id
}

async fn seed_post(repo: &PostRepository, owner_id: i32, title: &str) -> post::Model {
    repo.create(post::ActiveModel {
        title: Set(title.to_string()),
        body: Set("Body".to_string()),
        created_at: Set(Utc::now()),
        owner_id: Set(owner_id),
        ..Default::default()
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_unique_username_and_email() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.connection());
    seed_user(&users, "alice").await;

    let same_name = users
        .create(new_user(
            "alice".to_string(),
            "other@example.com".to_string(),
            "hash".to_string(),
        ))
        .await;
    assert!(matches!(
        same_name,
        Err(AppError::Duplicate(DuplicateField::Username))
    ));

    let same_email = users
        .create(new_user(
            "alice2".to_string(),
            "alice@example.com".to_string(),
            "hash".to_string(),
        ))
        .await;
    assert!(matches!(
        same_email,
        Err(AppError::Duplicate(DuplicateField::Email))
    ));
}

#[tokio::test]
async fn test_usernames_are_case_sensitive() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.connection());
    seed_user(&users, "alice").await;

    let result = users
        .create(new_user(
            "Alice".to_string(),
            "Alice@example.com".to_string(),
            "hash".to_string(),
        ))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_like_pair_is_unique() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.connection());
    let posts = PostRepository::new(db.connection());
    let likes = LikeRepository::new(db.connection());

    let alice = seed_user(&users, "alice").await;
    let post = seed_post(&posts, alice, "Hello").await;

    assert!(likes.toggle(alice, post.id).await.unwrap());
    assert!(!likes.toggle(alice, post.id).await.unwrap());
    assert_eq!(likes.count_by_post(post.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_delete_with_dependents_removes_comments_and_likes() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.connection());
    let posts = PostRepository::new(db.connection());
    let comments = CommentRepository::new(db.connection());
    let likes = LikeRepository::new(db.connection());

    let alice = seed_user(&users, "alice").await;
    let bob = seed_user(&users, "bob").await;
    let post = seed_post(&posts, alice, "Hello").await;

    comments
        .create(comment::ActiveModel {
            body: Set("hi".to_string()),
            created_at: Set(Utc::now()),
            owner_id: Set(bob),
            post_id: Set(post.id),
            ..Default::default()
        })
        .await
        .unwrap();
    likes.toggle(bob, post.id).await.unwrap();

    posts.delete_with_dependents(post.id).await.unwrap();

    assert!(posts.find_by_id(post.id).await.unwrap().is_none());
    assert_eq!(comments.count_by_post(post.id).await.unwrap(), 0);
    assert_eq!(likes.count_by_post(post.id).await.unwrap(), 0);
}

#[tokio::test]
async fn test_comment_on_missing_post_rejected() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.connection());
    let comments = CommentRepository::new(db.connection());
    let alice = seed_user(&users, "alice").await;

    let result = comments
        .create(comment::ActiveModel {
            body: Set("orphan".to_string()),
            created_at: Set(Utc::now()),
            owner_id: Set(alice),
            post_id: Set(12345),
            ..Default::default()
        })
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn test_find_page_breaks_timestamp_ties_by_id() {
    let db = TestDatabase::in_memory().await.unwrap();
    let users = UserRepository::new(db.connection());
    let posts = PostRepository::new(db.connection());
    let alice = seed_user(&users, "alice").await;

    let instant = Utc::now() - Duration::minutes(5);
    let mut ids = Vec::new();
    for title in ["a", "b", "c"] {
        let created = posts
            .create(post::ActiveModel {
                title: Set(title.to_string()),
                body: Set("Body".to_string()),
                created_at: Set(instant),
                owner_id: Set(alice),
                ..Default::default()
            })
            .await
            .unwrap();
        ids.push(created.id);
    }

    let page: Vec<i32> = posts
        .find_page(None, 0, 10)
        .await
        .unwrap()
        .into_iter()
        .map(|(post, _)| post.id)
        .collect();
    ids.reverse();
    assert_eq!(page, ids);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_postgres_unique_username() {
    let db = TestDatabase::postgres(&TestDbConfig::default())
        .await
        .expect("Failed to connect");
    db.cleanup().await.unwrap();

    let users = UserRepository::new(db.connection());
    seed_user(&users, "alice").await;
    let result = users
        .create(new_user(
            "alice".to_string(),
            "x@example.com".to_string(),
            "hash".to_string(),
        ))
        .await;
    assert!(matches!(
        result,
        Err(AppError::Duplicate(DuplicateField::Username))
    ));
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_postgres_toggle_like() {
    let db = TestDatabase::postgres(&TestDbConfig::default())
        .await
        .expect("Failed to connect");
    db.cleanup().await.unwrap();

    let users = UserRepository::new(db.connection());
    let posts = PostRepository::new(db.connection());
    let likes = LikeRepository::new(db.connection());
    let alice = seed_user(&users, "alice").await;
    let post = seed_post(&posts, alice, "Hello").await;

    assert!(likes.toggle(alice, post.id).await.unwrap());
    assert_eq!(likes.count_by_post(post.id).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires running PostgreSQL instance"]
async fn test_postgres_concurrent_toggles() {
    let db = TestDatabase::postgres(&TestDbConfig::default())
        .await
        .expect("Failed to connect");
    db.cleanup().await.unwrap();

    let users = UserRepository::new(db.connection());
    let posts = PostRepository::new(db.connection());
    let likes = LikeRepository::new(db.connection());
    let alice = seed_user(&users, "alice").await;
    let post = seed_post(&posts, alice, "Hello").await;

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let likes = likes.clone();
            tokio::spawn(async move { likes.toggle(alice, post.id).await })
        })
        .collect();
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }
    assert!(likes.count_by_post(post.id).await.unwrap() <= 1);
}

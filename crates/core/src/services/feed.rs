//! Paginated post feeds.

use inkwell_common::{AppError, AppResult};
use inkwell_db::repositories::{PostRepository, UserRepository};
use serde::Serialize;

use super::post::PostView;
use super::user::UserSummary;

/// One page of results.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> Page<T> {
    fn new(items: Vec<T>, page: u64, page_size: u64, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(page_size);
        Self {
            items,
            page,
            page_size,
            total_items,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// A user's page of posts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFeed {
    pub user: UserSummary,
    pub posts: Page<PostView>,
}

/// Feed service for business logic.
#[derive(Clone)]
pub struct FeedService {
    post_repo: PostRepository,
    user_repo: UserRepository,
    page_size: u64,
}

impl FeedService {
    /// Create a new feed service serving `page_size` posts per page.
    #[must_use]
    pub const fn new(post_repo: PostRepository, user_repo: UserRepository, page_size: u64) -> Self {
        Self {
            post_repo,
            user_repo,
            page_size,
        }
    }

    /// List posts newest first, optionally only those of one owner.
    ///
    /// Pages are 1-based. A page past the end is empty rather than an error.
    pub async fn list_posts(
        &self,
        page: u64,
        page_size: u64,
        owner_id: Option<i32>,
    ) -> AppResult<Page<PostView>> {
        if page == 0 {
            return Err(AppError::field("page", "must be at least 1"));
        }
        if page_size == 0 {
            return Err(AppError::field("page_size", "must be greater than zero"));
        }

        let total_items = self.post_repo.count(owner_id).await?;
        let offset = (page - 1)
            .checked_mul(page_size)
            .ok_or_else(|| AppError::field("page", "out of range"))?;

        let items = if offset >= total_items {
            Vec::new()
        } else {
            self.post_repo
                .find_page(owner_id, offset, page_size)
                .await?
                .into_iter()
                .map(|(post, owner)| PostView {
                    post,
                    author: owner.as_ref().map(UserSummary::from),
                })
                .collect()
        };

        Ok(Page::new(items, page, page_size, total_items))
    }

    /// The global feed at the configured page size.
    pub async fn home(&self, page: u64) -> AppResult<Page<PostView>> {
        self.list_posts(page, self.page_size, None).await
    }

    /// Posts by `username` at the configured page size.
    pub async fn user_feed(&self, username: &str, page: u64) -> AppResult<UserFeed> {
        let user = self
            .user_repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {username}")))?;

        let posts = self.list_posts(page, self.page_size, Some(user.id)).await?;
        Ok(UserFeed {
            user: UserSummary::from(&user),
            posts,
        })
    }
}

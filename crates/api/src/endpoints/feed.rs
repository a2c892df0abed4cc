//! Feed endpoints.

use axum::{
    Router,
    extract::{Path, Query, State},
    routing::get,
};
use inkwell_common::AppResult;
use inkwell_core::{Page, PostView, UserFeed};
use serde::Deserialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Page selector; pages start at 1.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: u64,
}

const fn first_page() -> u64 {
    1
}

/// The global feed, newest first.
async fn home(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<Page<PostView>>> {
    Ok(ApiResponse::ok(state.feed_service.home(query.page).await?))
}

/// One user's posts, newest first.
async fn user_posts(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<ApiResponse<UserFeed>> {
    Ok(ApiResponse::ok(
        state.feed_service.user_feed(&username, query.page).await?,
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/home", get(home))
        .route("/user/{username}", get(user_posts))
}

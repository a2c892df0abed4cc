//! Post, comment and like endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use inkwell_common::{AppResult, Flash};
use inkwell_core::{CommentInput, LikeState, PostDetail, PostInput};
use inkwell_db::entities::{comment, post as post_entity};
use serde::Serialize;

use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::ApiResponse,
};

/// Publish a new post.
async fn create(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<PostInput>,
) -> AppResult<ApiResponse<post_entity::Model>> {
    let post = state.post_service.create(auth.actor(), input).await?;

    Ok(ApiResponse::created(post).with_flash(Flash::success("Your post has been created!")))
}

/// A post with its comments and like state.
async fn show(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<PostDetail>> {
    Ok(ApiResponse::ok(
        state.post_service.detail(auth.actor(), id).await?,
    ))
}

/// Comment on a post.
async fn add_comment(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<CommentInput>,
) -> AppResult<ApiResponse<comment::Model>> {
    let comment = state
        .comment_service
        .add(auth.actor(), id, input)
        .await?;

    Ok(ApiResponse::created(comment).with_flash(Flash::success("Your comment has been added!")))
}

/// Edit a post's title and body.
async fn update(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(input): Json<PostInput>,
) -> AppResult<ApiResponse<post_entity::Model>> {
    let post = state.post_service.update(auth.actor(), id, input).await?;

    Ok(ApiResponse::ok(post).with_flash(Flash::success("Your post has been updated!")))
}

/// Delete response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub id: i32,
    pub deleted: bool,
}

/// Delete a post with its comments and likes.
async fn delete(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<DeleteResponse>> {
    state.post_service.delete(auth.actor(), id).await?;

    Ok(ApiResponse::ok(DeleteResponse { id, deleted: true })
        .with_flash(Flash::success("Your post has been deleted!")))
}

/// Like or unlike a post.
async fn toggle_like(
    auth: MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<ApiResponse<LikeState>> {
    let like_state = state.like_service.toggle(auth.actor(), id).await?;

    let flash = if like_state.liked {
        Flash::success("You liked the post!")
    } else {
        Flash::info("You disliked the post.")
    };
    Ok(ApiResponse::ok(like_state).with_flash(flash))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/post/new", post(create))
        .route("/post/{id}", get(show).post(add_comment))
        .route("/post/{id}/update", post(update))
        .route("/post/{id}/delete", post(delete))
        .route("/post/{id}/like", post(toggle_like))
}

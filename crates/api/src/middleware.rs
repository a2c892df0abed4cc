//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use inkwell_core::{
    CommentService, FeedService, LikeService, PasswordResetService, PostService, UserService,
};

use crate::session::SessionManager;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub feed_service: FeedService,
    pub password_reset_service: PasswordResetService,
    pub sessions: SessionManager,
    /// Public base URL, used to build password reset links.
    pub server_url: String,
}

/// Authentication middleware.
///
/// A valid bearer session puts the user into request extensions. Anything
/// else leaves the request anonymous; handlers that need a user reject it.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let user_id = req
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .and_then(|token| state.sessions.resolve(token));

    if let Some(user_id) = user_id {
        match state.user_service.get(user_id).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(user_id, error = %e, "Session user not loaded"),
        }
    }

    next.run(req).await
}

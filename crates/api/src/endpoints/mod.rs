//! API endpoints.

mod account;
mod auth;
mod feed;
mod health;
mod password_reset;
mod posts;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(feed::router())
        .merge(auth::router())
        .merge(account::router())
        .merge(posts::router())
        .merge(password_reset::router())
}

//! HTTP API layer for inkwell.
//!
//! - **Endpoints**: feed, posts, comments, likes, accounts, password reset
//! - **Extractors**: acting identity from the session
//! - **Middleware**: bearer session authentication
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod session;

use std::time::Duration;

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use endpoints::router;
pub use middleware::AppState;
pub use session::SessionManager;

/// Largest accepted request body; profile pictures are the biggest uploads.
pub const MAX_BODY_BYTES: usize = 4 * 1024 * 1024;

/// The full application: routes, session authentication and transport layers.
pub fn app(state: AppState, request_timeout: Duration) -> Router {
    router()
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

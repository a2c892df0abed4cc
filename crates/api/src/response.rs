//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use inkwell_common::Flash;
use serde::Serialize;

/// Standard API response wrapper.
///
/// Errors are rendered by [`inkwell_common::AppError`] itself.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flash: Option<Flash>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self {
            data,
            flash: None,
            status: StatusCode::OK,
        }
    }

    /// Create a `201 Created` response.
    pub const fn created(data: T) -> Self {
        Self {
            data,
            flash: None,
            status: StatusCode::CREATED,
        }
    }

    /// Attach a one-shot status message.
    #[must_use]
    pub fn with_flash(mut self, flash: Flash) -> Self {
        self.flash = Some(flash);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

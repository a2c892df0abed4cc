//! Password reset endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use inkwell_common::{AppResult, Flash};
use inkwell_core::{ResetPasswordInput, ResetRequestInput, UserSummary};
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Reset request response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetRequestResponse {
    pub sent: bool,
}

/// Email a reset link.
async fn request_reset(
    State(state): State<AppState>,
    Json(input): Json<ResetRequestInput>,
) -> AppResult<ApiResponse<ResetRequestResponse>> {
    state
        .password_reset_service
        .request_reset(input, &state.server_url)
        .await?;

    Ok(ApiResponse::ok(ResetRequestResponse { sent: true }).with_flash(Flash::info(
        "An email has been sent with instructions to reset your password.",
    )))
}

/// Check a reset token before showing the new-password form.
async fn check_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> AppResult<ApiResponse<UserSummary>> {
    let user = state
        .password_reset_service
        .verify_reset_token(&token)
        .await?;
    Ok(ApiResponse::ok(UserSummary::from(&user)))
}

/// Set a new password.
async fn reset(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(input): Json<ResetPasswordInput>,
) -> AppResult<ApiResponse<UserSummary>> {
    let user = state
        .password_reset_service
        .reset_password(&token, input)
        .await?;

    Ok(ApiResponse::ok(UserSummary::from(&user)).with_flash(Flash::success(
        "Your password has been updated! You are now able to log in",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reset_password", post(request_reset))
        .route("/reset_password/{token}", get(check_token).post(reset))
}

//! Registration and login endpoints.

use axum::{Json, Router, extract::State, routing::post};
use inkwell_common::{AppResult, Flash};
use inkwell_core::{RegisterInput, UserSummary};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::MaybeAuthUser, middleware::AppState, response::ApiResponse,
    session::IssuedSession,
};

/// Create a new account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<UserSummary>> {
    let user = state.user_service.register(input).await?;

    Ok(ApiResponse::created(UserSummary::from(&user)).with_flash(Flash::success(
        "Your account has been created! You are now able to log in",
    )))
}

/// Login request.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// Login response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserSummary,
    #[serde(flatten)]
    pub session: IssuedSession,
}

/// Check credentials and issue a session token.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<LoginResponse>> {
    let user = state
        .user_service
        .authenticate(&req.email, &req.password)
        .await?;
    let session = state.sessions.issue(user.id, req.remember)?;

    tracing::info!(user_id = user.id, remember = req.remember, "User logged in");
    Ok(ApiResponse::ok(LoginResponse {
        user: UserSummary::from(&user),
        session,
    }))
}

/// Logout response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub ok: bool,
}

/// Log out. Sessions are stateless, so the client drops its token.
async fn logout(MaybeAuthUser(user): MaybeAuthUser) -> ApiResponse<LogoutResponse> {
    if let Some(user) = user {
        tracing::info!(user_id = user.id, "User logged out");
    }
    ApiResponse::ok(LogoutResponse { ok: true })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
}

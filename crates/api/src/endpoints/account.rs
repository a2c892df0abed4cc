//! Account endpoints.

use axum::{
    Router,
    extract::{Multipart, State},
    routing::get,
};
use inkwell_common::{AppError, AppResult, Flash};
use inkwell_core::{ProfilePicture, UpdateProfileInput};
use inkwell_db::entities::user;
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// The signed-in user's own profile.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub image_ref: String,
}

impl From<user::Model> for AccountResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            image_ref: user.image_ref,
        }
    }
}

/// Get the current account.
async fn show(AuthUser(user): AuthUser) -> ApiResponse<AccountResponse> {
    ApiResponse::ok(user.into())
}

fn bad_form(e: impl std::fmt::Display) -> AppError {
    AppError::Validation(format!("Malformed form data: {e}"))
}

/// Update username, email and/or picture from a multipart form.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<AccountResponse>> {
    let mut input = UpdateProfileInput::default();
    let mut picture: Option<ProfilePicture> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "username" => {
                let text = field.text().await.map_err(bad_form)?;
                if !text.is_empty() {
                    input.username = Some(text);
                }
            }
            "email" => {
                let text = field.text().await.map_err(bad_form)?;
                if !text.is_empty() {
                    input.email = Some(text);
                }
            }
            "picture" => {
                let filename = field.file_name().map(ToString::to_string);
                let data = field.bytes().await.map_err(bad_form)?.to_vec();
                // Browsers send an empty part when no file was chosen
                if let Some(filename) = filename.filter(|_| !data.is_empty()) {
                    picture = Some(ProfilePicture { data, filename });
                }
            }
            _ => {}
        }
    }

    let updated = state
        .user_service
        .update_profile(&user, input, picture)
        .await?;

    Ok(ApiResponse::ok(updated.into()).with_flash(Flash::success("Your account has been updated!")))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/account", get(show).post(update))
}

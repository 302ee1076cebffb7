use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    routing::put,
};

use crate::{
    dto::profile::{
        DietaryPreferencesRequest, ProfilePictureForm, ProfilePictureResponse, UpdateProfileRequest,
    },
    error::{AppError, AppResult},
    extract::AppJson,
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::profile_service::{self, ImageUpload},
    state::AppState,
};

/// Largest accepted profile picture.
pub const MAX_PICTURE_BYTES: usize = 5 * 1024 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile/update/", put(update_profile).patch(update_profile))
        .route(
            "/profile/picture/",
            put(update_picture).layer(DefaultBodyLimit::max(MAX_PICTURE_BYTES)),
        )
        .route(
            "/profile/dietary-preferences/",
            put(update_dietary_preferences),
        )
}

#[utoipa::path(
    put,
    path = "/api/profile/update/",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated (PATCH behaves the same)", body = ApiResponse<User>),
        (status = 400, description = "Invalid or duplicate email/username")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<UpdateProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = profile_service::update_profile(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/profile/dietary-preferences/",
    request_body = DietaryPreferencesRequest,
    responses(
        (status = 200, description = "Flags updated", body = ApiResponse<User>)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_dietary_preferences(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<DietaryPreferencesRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = profile_service::update_dietary_preferences(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/profile/picture/",
    request_body(content = ProfilePictureForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture replaced", body = ApiResponse<ProfilePictureResponse>),
        (status = 400, description = "No image provided or not an image")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_picture(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ApiResponse<ProfilePictureResponse>>> {
    let mut multipart = multipart?;
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.body_text()))?
    {
        if field.name() != Some("profile_picture") {
            continue;
        }
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::BadRequest(err.body_text()))?;
        upload = Some(ImageUpload {
            content_type,
            bytes,
        });
        break;
    }

    let resp = profile_service::update_profile_picture(&state, &user, upload).await?;
    Ok(Json(resp))
}

use bytes::Bytes;
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::profile::{DietaryPreferencesRequest, ProfilePictureResponse, UpdateProfileRequest},
    entity::{Users, users},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    response::ApiResponse,
    services::{
        auth_service::{ensure_identity_free, normalize_email, normalize_username},
        unique_violation,
    },
    state::AppState,
    storage::{ImageStore, ext_from_mime},
};

/// Raw upload pulled out of the multipart body by the handler.
#[derive(Debug)]
pub struct ImageUpload {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

async fn load_user(state: &AppState, user_id: Uuid) -> AppResult<users::Model> {
    Users::find_by_id(user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

async fn save(
    state: &AppState,
    active: users::ActiveModel,
    current: users::Model,
) -> AppResult<users::Model> {
    if !active.is_changed() {
        return Ok(current);
    }
    active
        .update(&state.orm)
        .await
        .map_err(|err| unique_violation(err, "A user with that email or username already exists"))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    payload: UpdateProfileRequest,
) -> AppResult<ApiResponse<User>> {
    let current = load_user(state, user.user_id).await?;

    let username = payload
        .username
        .as_deref()
        .map(normalize_username)
        .transpose()?
        .filter(|u| *u != current.username);
    let email = payload
        .email
        .as_deref()
        .map(normalize_email)
        .transpose()?
        .filter(|e| *e != current.email);
    ensure_identity_free(
        state,
        email.as_deref(),
        username.as_deref(),
        Some(user.user_id),
    )
    .await?;

    let mut active = current.clone().into_active_model();
    if let Some(username) = username {
        active.username = Set(username);
    }
    if let Some(email) = email {
        active.email = Set(email);
    }
    if let Some(full_name) = payload.full_name {
        active.full_name = Set(full_name.trim().to_string());
    }
    if let Some(phone) = payload.phone_number {
        let phone = phone.trim().to_string();
        active.phone_number = Set((!phone.is_empty()).then_some(phone));
    }
    payload.dietary.apply(&mut active);

    let updated = save(state, active, current).await?;
    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::ProfileUpdate,
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Profile updated successfully",
        User::from_entity(updated, state.images.as_ref()),
        None,
    ))
}

pub async fn update_dietary_preferences(
    state: &AppState,
    user: &AuthUser,
    payload: DietaryPreferencesRequest,
) -> AppResult<ApiResponse<User>> {
    let current = load_user(state, user.user_id).await?;
    let mut active = current.clone().into_active_model();
    payload.apply(&mut active);
    let updated = save(state, active, current).await?;

    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::DietaryUpdate,
        serde_json::json!({ "fields": payload.provided() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Dietary preferences updated successfully",
        User::from_entity(updated, state.images.as_ref()),
        None,
    ))
}

pub async fn update_profile_picture(
    state: &AppState,
    user: &AuthUser,
    upload: Option<ImageUpload>,
) -> AppResult<ApiResponse<ProfilePictureResponse>> {
    let upload = upload
        .filter(|u| !u.bytes.is_empty())
        .ok_or_else(|| AppError::BadRequest("No image provided".into()))?;
    let content_type = upload.content_type.as_deref().unwrap_or_default();
    let ext = ext_from_mime(content_type).ok_or_else(|| {
        AppError::BadRequest("Upload a valid image. The file must be JPEG, PNG, WebP or GIF".into())
    })?;

    let current = load_user(state, user.user_id).await?;
    let key = format!("profile_pictures/{}/{}.{ext}", user.user_id, Uuid::new_v4());

    let previous = current.profile_picture.clone();
    let mut active = current.into_active_model();
    active.profile_picture = Set(Some(key.clone()));
    put_then_commit(state.images.as_ref(), &key, upload.bytes, content_type, async {
        active.update(&state.orm).await?;
        Ok(())
    })
    .await?;

    if let Some(old) = previous.filter(|old| !old.starts_with("http")) {
        if let Err(err) = state.images.delete_object(&old).await {
            tracing::warn!(error = %err, key = %old, "failed to delete old profile picture");
        }
    }

    tracing::info!(user_id = %user.user_id, key = %key, "profile picture updated");
    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::ProfilePictureUpdate,
        serde_json::json!({ "key": key }),
    )
    .await;

    let url = state.images.public_url(&key);
    let message = "Profile picture updated successfully";
    Ok(ApiResponse::success(
        message,
        ProfilePictureResponse {
            message: message.to_string(),
            profile_picture: url,
        },
        None,
    ))
}

/// Stores the object, then runs `commit`. A failed commit removes the object
/// again so the store never keeps a file no row points at.
async fn put_then_commit<T, F>(
    images: &dyn ImageStore,
    key: &str,
    bytes: Bytes,
    content_type: &str,
    commit: F,
) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    images.put_object(key, bytes, content_type).await?;
    match commit.await {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Err(cleanup) = images.delete_object(key).await {
                tracing::warn!(error = %cleanup, key, "failed to remove orphaned upload");
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalImageStore;

    fn store() -> LocalImageStore {
        let root = std::env::temp_dir().join(format!("kainan-upload-{}", Uuid::new_v4()));
        LocalImageStore::new(root, "http://localhost:3000")
    }

    #[tokio::test]
    async fn failed_commit_removes_the_stored_picture() {
        let store = store();
        let key = "profile_pictures/u/new.png";
        let result: AppResult<()> = put_then_commit(
            &store,
            key,
            Bytes::from_static(b"png"),
            "image/png",
            async { Err(AppError::Internal(anyhow::anyhow!("update failed"))) },
        )
        .await;

        assert!(result.is_err());
        assert!(!store.root().join(key).exists());
    }

    #[tokio::test]
    async fn committed_picture_stays() {
        let store = store();
        let key = "profile_pictures/u/kept.png";
        put_then_commit(&store, key, Bytes::from_static(b"png"), "image/png", async {
            Ok(())
        })
        .await
        .expect("commit");

        assert!(store.root().join(key).exists());
        tokio::fs::remove_dir_all(store.root()).await.expect("cleanup");
    }
}

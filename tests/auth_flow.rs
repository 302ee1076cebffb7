mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use bytes::Bytes;
use kainan_api::{
    app::build_app,
    dto::{
        auth::{LoginRequest, LogoutRequest, RefreshRequest},
        profile::{DietaryPreferencesRequest, UpdateProfileRequest},
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{
        auth_service,
        profile_service::{self, ImageUpload},
    },
};
use tower::ServiceExt;

fn login(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn register_returns_usable_tokens_and_rejects_duplicates() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let username = common::unique("maria");
    let email = format!("{username}@Example.com");

    let resp =
        auth_service::register_user(&state, common::register_request(&username, &email)).await?;
    let auth = resp.data.expect("auth data");
    assert_eq!(auth.user.email, email.to_lowercase());
    let claims = state.jwt.verify_access(&auth.access)?;
    assert_eq!(claims.sub, auth.user.id);
    state.jwt.verify_refresh(&auth.refresh)?;

    let dup_email = auth_service::register_user(
        &state,
        common::register_request(&common::unique("other"), &email),
    )
    .await;
    assert!(matches!(dup_email, Err(AppError::BadRequest(_))));

    let dup_username = auth_service::register_user(
        &state,
        common::register_request(&username, &format!("{}@example.com", common::unique("x"))),
    )
    .await;
    assert!(matches!(dup_username, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn login_token_authorizes_current_user() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, email) = common::create_user(&state).await;

    let resp = auth_service::login_user(&state, login(&email, common::PASSWORD)).await?;
    let access = resp.data.expect("auth data").access;

    let response = build_app(state.clone())
        .oneshot(
            Request::get("/api/user/")
                .header(header::AUTHORIZATION, format!("Bearer {access}"))
                .body(Body::empty())?,
        )
        .await?;
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await?)?;
    assert_eq!(body["data"]["id"], user.user_id.to_string());
    assert!(body["data"].get("password_hash").is_none());
    assert_eq!(body["data"]["is_vegan"], false);

    match auth_service::login_user(&state, login(&email, "wrong")).await {
        Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Invalid password"),
        other => panic!("expected invalid password, got {:?}", other.map(|r| r.message)),
    }
    match auth_service::login_user(&state, login("nobody@example.com", "x")).await {
        Err(AppError::BadRequest(msg)) => assert_eq!(msg, "User not found"),
        other => panic!("expected unknown user, got {:?}", other.map(|r| r.message)),
    }
    Ok(())
}

#[tokio::test]
async fn logout_revokes_refresh_token() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, email) = common::create_user(&state).await;
    let refresh = auth_service::login_user(&state, login(&email, common::PASSWORD))
        .await?
        .data
        .expect("auth data")
        .refresh;

    let refreshed = auth_service::refresh_access(
        &state,
        RefreshRequest {
            refresh: Some(refresh.clone()),
        },
    )
    .await?;
    let access = refreshed.data.expect("access").access;
    assert_eq!(state.jwt.verify_access(&access)?.sub, user.user_id);

    let (stranger, _) = common::create_user(&state).await;
    let foreign = auth_service::logout_user(
        &state,
        &stranger,
        LogoutRequest {
            refresh: Some(refresh.clone()),
        },
    )
    .await;
    assert!(matches!(foreign, Err(AppError::BadRequest(_))));

    let resp = auth_service::logout_user(
        &state,
        &user,
        LogoutRequest {
            refresh: Some(refresh.clone()),
        },
    )
    .await?;
    assert_eq!(resp.message, "Successfully logged out");
    // revoking twice is fine
    auth_service::logout_user(
        &state,
        &user,
        LogoutRequest {
            refresh: Some(refresh.clone()),
        },
    )
    .await?;

    let again = auth_service::refresh_access(
        &state,
        RefreshRequest {
            refresh: Some(refresh),
        },
    )
    .await;
    assert!(matches!(again, Err(AppError::Unauthorized(_))));
    Ok(())
}

#[tokio::test]
async fn profile_update_ignores_password_and_keeps_identity_unique() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, email) = common::create_user(&state).await;
    let (_, taken_email) = common::create_user(&state).await;

    let payload: UpdateProfileRequest = serde_json::from_value(serde_json::json!({
        "full_name": "Jose Rizal",
        "phone_number": "09171234567",
        "password": "changed",
        "is_halal": true
    }))?;
    let updated = profile_service::update_profile(&state, &user, payload)
        .await?
        .data
        .expect("user");
    assert_eq!(updated.full_name, "Jose Rizal");
    assert_eq!(updated.phone_number.as_deref(), Some("09171234567"));
    assert!(updated.dietary.is_halal);

    // old password still works
    auth_service::login_user(&state, login(&email, common::PASSWORD)).await?;

    let clash = profile_service::update_profile(
        &state,
        &user,
        UpdateProfileRequest {
            email: Some(taken_email),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(clash, Err(AppError::BadRequest(_))));
    Ok(())
}

#[tokio::test]
async fn dietary_update_touches_only_given_flags() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, _) = common::create_user(&state).await;

    let first: DietaryPreferencesRequest = serde_json::from_value(serde_json::json!({
        "is_vegan": true,
        "is_gluten_free": true,
        "is_pizza_lover": true
    }))?;
    profile_service::update_dietary_preferences(&state, &user, first).await?;

    let second: DietaryPreferencesRequest =
        serde_json::from_value(serde_json::json!({ "is_vegan": false }))?;
    let profile = profile_service::update_dietary_preferences(&state, &user, second)
        .await?
        .data
        .expect("user");
    assert!(!profile.dietary.is_vegan);
    assert!(profile.dietary.is_gluten_free);
    assert!(!profile.dietary.is_kosher);
    Ok(())
}

#[tokio::test]
async fn profile_picture_replaces_previous_file() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, _): (AuthUser, _) = common::create_user(&state).await;
    let upload = || ImageUpload {
        content_type: Some("image/png".into()),
        bytes: Bytes::from_static(b"\x89PNG fake"),
    };

    let first = profile_service::update_profile_picture(&state, &user, Some(upload()))
        .await?
        .data
        .expect("picture")
        .profile_picture;
    let prefix = "http://localhost:3000/media/";
    assert!(first.starts_with(prefix), "{first}");
    let root = std::path::Path::new(&state.config.media_root);
    let first_path = root.join(first.trim_start_matches(prefix));
    assert!(first_path.exists());

    let second = profile_service::update_profile_picture(&state, &user, Some(upload()))
        .await?
        .data
        .expect("picture")
        .profile_picture;
    assert_ne!(first, second);
    assert!(!first_path.exists());
    assert!(root.join(second.trim_start_matches(prefix)).exists());

    let missing = profile_service::update_profile_picture(&state, &user, None).await;
    assert!(matches!(missing, Err(AppError::BadRequest(m)) if m == "No image provided"));

    let _ = tokio::fs::remove_dir_all(root).await;
    Ok(())
}

use lazy_static::lazy_static;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::auth::{
        AccessToken, AuthResponse, LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest,
    },
    entity::{
        RevokedTokens, Users, revoked_tokens,
        users::{self, Column as UserCol},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::User,
    password::{hash_password, verify_password},
    response::ApiResponse,
    services::unique_violation,
    state::AppState,
};

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
}

/// Trims and lowercases, then checks the basic address shape.
pub(crate) fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(AppError::BadRequest("Enter a valid email address".into()));
    }
    Ok(email)
}

pub(crate) fn normalize_username(raw: &str) -> AppResult<String> {
    let username = raw.trim();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".into()));
    }
    Ok(username.to_string())
}

/// Fails when another account already holds `email` or `username`.
pub(crate) async fn ensure_identity_free(
    state: &AppState,
    email: Option<&str>,
    username: Option<&str>,
    except: Option<Uuid>,
) -> AppResult<()> {
    if let Some(email) = email {
        let mut finder = Users::find().filter(UserCol::Email.eq(email));
        if let Some(id) = except {
            finder = finder.filter(UserCol::Id.ne(id));
        }
        if finder.one(&state.orm).await?.is_some() {
            return Err(AppError::BadRequest(
                "A user with that email already exists".into(),
            ));
        }
    }
    if let Some(username) = username {
        let mut finder = Users::find().filter(UserCol::Username.eq(username));
        if let Some(id) = except {
            finder = finder.filter(UserCol::Id.ne(id));
        }
        if finder.one(&state.orm).await?.is_some() {
            return Err(AppError::BadRequest(
                "A user with that username already exists".into(),
            ));
        }
    }
    Ok(())
}

pub async fn register_user(
    state: &AppState,
    payload: RegisterRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let username = normalize_username(&payload.username)?;
    let email = normalize_email(&payload.email)?;
    if payload.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }
    ensure_identity_free(state, Some(&email), Some(&username), None).await?;

    let password_hash = hash_password(&payload.password)?;
    let mut active = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash),
        full_name: Set(payload.full_name.unwrap_or_default().trim().to_string()),
        phone_number: Set(payload.phone_number.filter(|p| !p.trim().is_empty())),
        profile_picture: Set(None),
        role: Set("user".into()),
        created_at: NotSet,
        ..Default::default()
    };
    payload.dietary.apply(&mut active);
    let user = active
        .insert(&state.orm)
        .await
        .map_err(|err| unique_violation(err, "A user with that email or username already exists"))?;

    let tokens = state.jwt.issue_pair(user.id, &user.role)?;
    tracing::info!(user_id = %user.id, "user registered");
    audit::record(
        &state.pool,
        user.id,
        AuditAction::UserRegister,
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = AuthResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        user: User::from_entity(user, state.images.as_ref()),
    };
    Ok(ApiResponse::single("User registered", resp))
}

pub async fn login_user(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<AuthResponse>> {
    let email = payload.email.trim().to_lowercase();
    let user = Users::find()
        .filter(UserCol::Email.eq(email))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest("User not found".into()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        return Err(AppError::BadRequest("Invalid password".into()));
    }

    let tokens = state.jwt.issue_pair(user.id, &user.role)?;
    audit::record(
        &state.pool,
        user.id,
        AuditAction::UserLogin,
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    let resp = AuthResponse {
        access: tokens.access,
        refresh: tokens.refresh,
        user: User::from_entity(user, state.images.as_ref()),
    };
    Ok(ApiResponse::single("Login successful", resp))
}

pub async fn refresh_access(
    state: &AppState,
    payload: RefreshRequest,
) -> AppResult<ApiResponse<AccessToken>> {
    let token = payload
        .refresh
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Refresh token required".into()))?;
    let invalid = || AppError::Unauthorized("Invalid token".into());

    let claims = state.jwt.verify_refresh(token.trim()).map_err(|err| {
        tracing::debug!(error = %err, "refresh rejected");
        invalid()
    })?;
    if RevokedTokens::find_by_id(claims.jti)
        .one(&state.orm)
        .await?
        .is_some()
    {
        tracing::debug!(jti = %claims.jti, "revoked refresh token presented");
        return Err(invalid());
    }
    let user = Users::find_by_id(claims.sub)
        .one(&state.orm)
        .await?
        .ok_or_else(invalid)?;

    let access = state.jwt.sign_access(user.id, &user.role)?;
    Ok(ApiResponse::single("Token refreshed", AccessToken { access }))
}

pub async fn logout_user(
    state: &AppState,
    user: &AuthUser,
    payload: LogoutRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let token = payload
        .refresh
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Refresh token required".into()))?;
    let claims = state
        .jwt
        .verify_refresh(token.trim())
        .ok()
        .filter(|claims| claims.sub == user.user_id)
        .ok_or_else(|| AppError::BadRequest("Invalid token".into()))?;

    let revoked = revoked_tokens::ActiveModel {
        jti: Set(claims.jti),
        user_id: Set(user.user_id),
        expires_at: Set(claims.expires_at().fixed_offset()),
        revoked_at: NotSet,
    };
    RevokedTokens::insert(revoked)
        .on_conflict(
            OnConflict::column(revoked_tokens::Column::Jti)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&state.orm)
        .await?;

    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::UserLogout,
        serde_json::json!({ "jti": claims.jti }),
    )
    .await;

    Ok(ApiResponse::acknowledged("Successfully logged out"))
}

pub async fn current_user(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<User>> {
    let model = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    Ok(ApiResponse::success(
        "OK",
        User::from_entity(model, state.images.as_ref()),
        None,
    ))
}

use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

/// Mutations that leave a row in `audit_logs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserRegister,
    UserLogin,
    UserLogout,
    ProfileUpdate,
    DietaryUpdate,
    ProfilePictureUpdate,
    ProductCreate,
    ProductUpdate,
    ProductDelete,
    FavoriteToggle,
    FavoriteAdd,
    FavoriteUpdate,
    FavoriteRemove,
    CartAdd,
    CartRemove,
    OrderCreate,
}

impl AuditAction {
    pub fn name(self) -> &'static str {
        match self {
            AuditAction::UserRegister => "user_register",
            AuditAction::UserLogin => "user_login",
            AuditAction::UserLogout => "user_logout",
            AuditAction::ProfileUpdate => "profile_update",
            AuditAction::DietaryUpdate => "dietary_update",
            AuditAction::ProfilePictureUpdate => "profile_picture_update",
            AuditAction::ProductCreate => "product_create",
            AuditAction::ProductUpdate => "product_update",
            AuditAction::ProductDelete => "product_delete",
            AuditAction::FavoriteToggle => "favorite_toggle",
            AuditAction::FavoriteAdd => "favorite_add",
            AuditAction::FavoriteUpdate => "favorite_update",
            AuditAction::FavoriteRemove => "favorite_remove",
            AuditAction::CartAdd => "cart_add",
            AuditAction::CartRemove => "cart_remove",
            AuditAction::OrderCreate => "order_create",
        }
    }

    /// Table the action touched.
    pub fn resource(self) -> &'static str {
        match self {
            AuditAction::UserRegister
            | AuditAction::UserLogin
            | AuditAction::ProfileUpdate
            | AuditAction::DietaryUpdate
            | AuditAction::ProfilePictureUpdate => "users",
            AuditAction::UserLogout => "revoked_tokens",
            AuditAction::ProductCreate
            | AuditAction::ProductUpdate
            | AuditAction::ProductDelete => "products",
            AuditAction::FavoriteToggle
            | AuditAction::FavoriteAdd
            | AuditAction::FavoriteUpdate
            | AuditAction::FavoriteRemove => "favorites",
            AuditAction::CartAdd | AuditAction::CartRemove => "cart_items",
            AuditAction::OrderCreate => "orders",
        }
    }
}

pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: AuditAction,
    metadata: Option<Value>,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(action.name())
    .bind(action.resource())
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}

/// Audit rows never fail the request that produced them.
pub async fn record(pool: &DbPool, user_id: Uuid, action: AuditAction, metadata: Value) {
    if let Err(err) = log_audit(pool, Some(user_id), action, Some(metadata)).await {
        tracing::warn!(error = %err, action = action.name(), "audit log failed");
    }
}

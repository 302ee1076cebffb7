use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::cart::{AddToCartRequest, CartList},
    entity::{CartItems, Products, cart_items::Column as CartCol, products},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::CartLine,
    response::{ApiResponse, Meta},
    state::AppState,
    storage::absolute_url,
};

/// Upper bound for one cart line, the range of its INTEGER column.
pub const MAX_LINE_QUANTITY: i32 = i32::MAX;

#[derive(FromRow)]
struct CartItemRow {
    id: Uuid,
    product_id: Uuid,
    quantity: i32,
}

fn cart_line(state: &AppState, id: Uuid, quantity: i32, product: products::Model) -> CartLine {
    CartLine {
        id,
        product: product.id,
        product_name: product.name,
        product_price: product.price,
        product_image: product
            .image_url
            .as_deref()
            .map(|value| absolute_url(state.images.as_ref(), value)),
        quantity,
    }
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let items: Vec<CartLine> = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .order_by_asc(CartCol::Id)
        .find_also_related(Products)
        .all(&state.orm)
        .await?
        .into_iter()
        .filter_map(|(item, product)| {
            product.map(|p| cart_line(state, item.id, item.quantity, p))
        })
        .collect();

    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

/// Adds `quantity` to the caller's line for the product, creating it if needed.
/// A single upsert so concurrent adds to the same line both count.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartLine>> {
    if payload.quantity < 1 {
        return Err(AppError::BadRequest("Quantity must be at least 1".to_string()));
    }
    let product = Products::find_by_id(payload.product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))?;

    // The WHERE guard skips the update, returning no row, when the sum would
    // overflow the INTEGER column.
    let row = sqlx::query_as::<_, CartItemRow>(
        r#"
        INSERT INTO cart_items (id, user_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity
        WHERE cart_items.quantity <= $5 - EXCLUDED.quantity
        RETURNING id, product_id, quantity
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(product.id)
    .bind(payload.quantity)
    .bind(MAX_LINE_QUANTITY)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| {
        AppError::BadRequest(format!("Cart quantity cannot exceed {MAX_LINE_QUANTITY}"))
    })?;

    tracing::debug!(
        user_id = %user.user_id,
        product_id = %row.product_id,
        quantity = row.quantity,
        "cart line upserted"
    );
    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::CartAdd,
        serde_json::json!({
            "product_id": product.id,
            "added": payload.quantity,
            "quantity": row.quantity,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to cart",
        cart_line(state, row.id, row.quantity, product),
        None,
    ))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .filter(CartCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::not_found("Cart item"));
    }

    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::CartRemove,
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::acknowledged("Removed from cart"))
}

use std::collections::HashSet;

use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder, QuerySelect, Set, sea_query::OnConflict,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::favorites::{FavoriteList, FavoriteProductList, FavoriteRequest, ToggleFavoriteResponse},
    entity::{
        Favorites, Products,
        favorites::{self, Column as FavCol},
        products,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Favorite, Product},
    response::{ApiResponse, Meta},
    services::unique_violation,
    state::AppState,
};

pub enum ToggleOutcome {
    Added,
    Removed,
}

/// Which of `product_ids` the user has favorited.
pub(crate) async fn favorite_product_ids(
    state: &AppState,
    user_id: Uuid,
    product_ids: &[Uuid],
) -> AppResult<HashSet<Uuid>> {
    if product_ids.is_empty() {
        return Ok(HashSet::new());
    }
    let ids: Vec<Uuid> = Favorites::find()
        .select_only()
        .column(FavCol::ProductId)
        .filter(FavCol::UserId.eq(user_id))
        .filter(FavCol::ProductId.is_in(product_ids.iter().copied()))
        .into_tuple()
        .all(&state.orm)
        .await?;
    Ok(ids.into_iter().collect())
}

async fn ensure_product(state: &AppState, product_id: Uuid) -> AppResult<products::Model> {
    Products::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

async fn owned_favorite(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<favorites::Model> {
    Favorites::find_by_id(id)
        .filter(FavCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Favorite"))
}

async fn favorites_with_products(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<Vec<(favorites::Model, products::Model)>> {
    let rows = Favorites::find()
        .filter(FavCol::UserId.eq(user.user_id))
        .order_by_desc(FavCol::CreatedAt)
        .find_also_related(Products)
        .all(&state.orm)
        .await?;
    Ok(rows
        .into_iter()
        .filter_map(|(fav, product)| product.map(|p| (fav, p)))
        .collect())
}

fn favorited(state: &AppState, product: products::Model) -> Product {
    Product::from_entity(product, state.images.as_ref()).with_favorite(true)
}

pub async fn toggle_favorite(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<(ToggleOutcome, ApiResponse<ToggleFavoriteResponse>)> {
    ensure_product(state, product_id).await?;

    let removed = Favorites::delete_many()
        .filter(FavCol::UserId.eq(user.user_id))
        .filter(FavCol::ProductId.eq(product_id))
        .exec(&state.orm)
        .await?;

    let outcome = if removed.rows_affected > 0 {
        ToggleOutcome::Removed
    } else {
        let favorite = favorites::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user.user_id),
            product_id: Set(product_id),
            created_at: NotSet,
        };
        Favorites::insert(favorite)
            .on_conflict(
                OnConflict::columns([FavCol::UserId, FavCol::ProductId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&state.orm)
            .await?;
        ToggleOutcome::Added
    };

    let status = match outcome {
        ToggleOutcome::Added => "added to favorites",
        ToggleOutcome::Removed => "removed from favorites",
    };
    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::FavoriteToggle,
        serde_json::json!({ "product_id": product_id, "status": status }),
    )
    .await;

    let resp = ApiResponse::success(
        status,
        ToggleFavoriteResponse {
            status: status.to_string(),
        },
        None,
    );
    Ok((outcome, resp))
}

/// Favorited products with full detail, newest favorite first.
pub async fn favorite_products(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<FavoriteProductList>> {
    let items: Vec<Product> = favorites_with_products(state, user)
        .await?
        .into_iter()
        .map(|(_, product)| favorited(state, product))
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", FavoriteProductList { items }, Some(meta)))
}

pub async fn list_favorites(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<FavoriteList>> {
    let items: Vec<Favorite> = favorites_with_products(state, user)
        .await?
        .into_iter()
        .map(|(fav, product)| Favorite::from_entity(fav, favorited(state, product)))
        .collect();
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("OK", FavoriteList { items }, Some(meta)))
}

pub async fn create_favorite(
    state: &AppState,
    user: &AuthUser,
    payload: FavoriteRequest,
) -> AppResult<ApiResponse<Favorite>> {
    let product = ensure_product(state, payload.product_id).await?;
    let favorite = favorites::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        product_id: Set(product.id),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|err| unique_violation(err, "Product is already in favorites"))?;

    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::FavoriteAdd,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Added to favorites",
        Favorite::from_entity(favorite, favorited(state, product)),
        None,
    ))
}

pub async fn get_favorite(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Favorite>> {
    let favorite = owned_favorite(state, user, id).await?;
    let product = ensure_product(state, favorite.product_id).await?;
    Ok(ApiResponse::success(
        "OK",
        Favorite::from_entity(favorite, favorited(state, product)),
        None,
    ))
}

/// Points an existing favorite at another product.
pub async fn update_favorite(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: FavoriteRequest,
) -> AppResult<ApiResponse<Favorite>> {
    let favorite = owned_favorite(state, user, id).await?;
    let product = ensure_product(state, payload.product_id).await?;

    let favorite = if favorite.product_id == product.id {
        favorite
    } else {
        let mut active = favorite.into_active_model();
        active.product_id = Set(product.id);
        active
            .update(&state.orm)
            .await
            .map_err(|err| unique_violation(err, "Product is already in favorites"))?
    };

    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::FavoriteUpdate,
        serde_json::json!({ "favorite_id": id, "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Favorite updated",
        Favorite::from_entity(favorite, favorited(state, product)),
        None,
    ))
}

pub async fn delete_favorite(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = Favorites::delete_many()
        .filter(FavCol::Id.eq(id))
        .filter(FavCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Favorite"));
    }

    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::FavoriteRemove,
        serde_json::json!({ "favorite_id": id }),
    )
    .await;

    Ok(ApiResponse::acknowledged("Removed from favorites"))
}

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, IntoActiveModel, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::products::{ActiveModel, Category, Column, Entity as Products, Model as ProductModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{CategoryOption, Product, max_amount},
    response::{ApiResponse, Meta},
    routes::params::{ProductQuery, ProductSortBy, SortOrder},
    services::favorite_service::favorite_product_ids,
    state::AppState,
};

/// Converts rows and marks `is_favorite` for the viewer. Anonymous viewers get `false`.
pub(crate) async fn annotate(
    state: &AppState,
    viewer: Option<&AuthUser>,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    let favorites = match viewer {
        Some(user) => {
            let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
            favorite_product_ids(state, user.user_id, &ids).await?
        }
        None => Default::default(),
    };
    Ok(models
        .into_iter()
        .map(|m| {
            let is_favorite = favorites.contains(&m.id);
            Product::from_entity(m, state.images.as_ref()).with_favorite(is_favorite)
        })
        .collect())
}

fn validate_price(price: Decimal) -> AppResult<()> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(AppError::BadRequest(
            "Ensure price is greater than or equal to 0".into(),
        ));
    }
    if price > max_amount() {
        return Err(AppError::BadRequest(format!(
            "Ensure price is less than or equal to {}",
            max_amount()
        )));
    }
    Ok(())
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::BadRequest("Product name is required".into()));
    }
    Ok(name.to_string())
}

pub async fn list_products(
    state: &AppState,
    viewer: Option<&AuthUser>,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{search}%");
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }
    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match query.sort_by.unwrap_or(ProductSortBy::CreatedAt) {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };
    let mut finder = Products::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = annotate(state, viewer, models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

async fn find_product(state: &AppState, id: Uuid) -> AppResult<ProductModel> {
    Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Product"))
}

pub async fn get_product(
    state: &AppState,
    viewer: Option<&AuthUser>,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let model = find_product(state, id).await?;
    let product = annotate(state, viewer, vec![model])
        .await?
        .pop()
        .ok_or_else(|| AppError::not_found("Product"))?;
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let name = validate_name(&payload.name)?;
    validate_price(payload.price)?;

    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(payload.description),
        price: Set(payload.price.round_dp(2)),
        image_url: Set(payload.image_url),
        available: Set(payload.available.unwrap_or(true)),
        category: Set(payload.category.unwrap_or(Category::All)),
        ingredients: Set(payload.ingredients),
        serving_size: Set(payload.serving_size),
        dietary_info: Set(payload.dietary_info),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    tracing::info!(product_id = %product.id, "product created");
    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::ProductCreate,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        Product::from_entity(product, state.images.as_ref()),
        None,
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    let current = find_product(state, id).await?;
    let mut active = current.clone().into_active_model();

    if let Some(name) = payload.name.as_deref() {
        active.name = Set(validate_name(name)?);
    }
    if let Some(price) = payload.price {
        validate_price(price)?;
        active.price = Set(price.round_dp(2));
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(available) = payload.available {
        active.available = Set(available);
    }
    if let Some(category) = payload.category {
        active.category = Set(category);
    }
    if let Some(ingredients) = payload.ingredients {
        active.ingredients = Set(Some(ingredients));
    }
    if let Some(serving_size) = payload.serving_size {
        active.serving_size = Set(Some(serving_size));
    }
    if let Some(dietary_info) = payload.dietary_info {
        active.dietary_info = Set(Some(dietary_info));
    }

    let product = if active.is_changed() {
        active.update(&state.orm).await?
    } else {
        current
    };

    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::ProductUpdate,
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product updated",
        Product::from_entity(product, state.images.as_ref()),
        None,
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Product"));
    }

    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::ProductDelete,
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::acknowledged("Product deleted"))
}

/// Available products in `category`. `ALL` in any case means every available
/// product; an unknown code yields an empty list.
pub async fn list_by_category(
    state: &AppState,
    viewer: Option<&AuthUser>,
    category: &str,
) -> AppResult<ApiResponse<ProductList>> {
    let mut finder = Products::find().filter(Column::Available.eq(true));
    match Category::parse(category) {
        Some(Category::All) => {}
        Some(parsed) => finder = finder.filter(Column::Category.eq(parsed)),
        None => {
            tracing::debug!(category, "unknown category filter");
            return Ok(ApiResponse::success(
                "Products",
                ProductList { items: Vec::new() },
                Some(Meta::total(0)),
            ));
        }
    }
    let models = finder.order_by_asc(Column::Name).all(&state.orm).await?;
    let items = annotate(state, viewer, models).await?;
    let meta = Meta::total(items.len());
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

/// `ALL` first with label "All", then each other used category once, by code.
pub fn category_options(used: impl IntoIterator<Item = Category>) -> Vec<CategoryOption> {
    let mut rest: Vec<Category> = used.into_iter().filter(|c| *c != Category::All).collect();
    rest.sort_by_key(|c| c.code());
    rest.dedup();

    let mut options = vec![CategoryOption {
        value: Category::All,
        label: "All".to_string(),
    }];
    options.extend(rest.into_iter().map(|c| CategoryOption {
        value: c,
        label: c.label().to_string(),
    }));
    options
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<Vec<CategoryOption>>> {
    let used: Vec<Category> = Products::find()
        .select_only()
        .column(Column::Category)
        .distinct()
        .into_tuple()
        .all(&state.orm)
        .await?;
    let options = category_options(used);
    let meta = Meta::total(options.len());
    Ok(ApiResponse::success("Categories", options, Some(meta)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn all_is_first_and_unique() {
        let options = category_options(vec![
            Category::Merienda,
            Category::All,
            Category::Agahan,
            Category::Merienda,
        ]);
        let values: Vec<Category> = options.iter().map(|o| o.value).collect();
        assert_eq!(
            values,
            vec![Category::All, Category::Agahan, Category::Merienda]
        );
        assert_eq!(options[0].label, "All");
        assert_eq!(options[1].label, "agahan");
    }

    #[test]
    fn empty_catalog_still_lists_all() {
        let options = category_options(Vec::new());
        assert_eq!(options.len(), 1);
        assert_eq!(options[0].value, Category::All);
    }

    #[test]
    fn price_must_not_be_negative() {
        assert!(validate_price(Decimal::ZERO).is_ok());
        assert!(validate_price(Decimal::from_str("10.50").expect("decimal")).is_ok());
        assert!(validate_price(Decimal::from_str("-0.01").expect("decimal")).is_err());
        assert!(validate_price(Decimal::from_str("100000000.00").expect("decimal")).is_err());
        assert!(validate_name("  ").is_err());
    }
}

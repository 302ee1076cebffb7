use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::favorites::{FavoriteList, FavoriteProductList, FavoriteRequest, ToggleFavoriteResponse},
    error::AppResult,
    extract::{AppJson, AppPath},
    middleware::auth::AuthUser,
    models::Favorite,
    response::ApiResponse,
    services::favorite_service::{self, ToggleOutcome},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/favorites/", get(list_favorites).post(create_favorite))
        .route("/favorites/toggle/{product_id}/", post(toggle_favorite))
        .route("/favorites/favorites_list/", get(favorites_list))
        .route(
            "/favorites/{id}/",
            get(get_favorite)
                .put(update_favorite)
                .patch(update_favorite)
                .delete(delete_favorite),
        )
}

#[utoipa::path(
    post,
    path = "/api/favorites/toggle/{product_id}/",
    params(
        ("product_id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 201, description = "added to favorites", body = ApiResponse<ToggleFavoriteResponse>),
        (status = 200, description = "removed from favorites", body = ApiResponse<ToggleFavoriteResponse>),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn toggle_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(product_id): AppPath<Uuid>,
) -> AppResult<(StatusCode, Json<ApiResponse<ToggleFavoriteResponse>>)> {
    let (outcome, resp) = favorite_service::toggle_favorite(&state, &user, product_id).await?;
    let status = match outcome {
        ToggleOutcome::Added => StatusCode::CREATED,
        ToggleOutcome::Removed => StatusCode::OK,
    };
    Ok((status, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/favorites/favorites_list/",
    responses(
        (status = 200, description = "Favorited products, newest favorite first", body = ApiResponse<FavoriteProductList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn favorites_list(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<FavoriteProductList>>> {
    let resp = favorite_service::favorite_products(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/favorites/",
    responses(
        (status = 200, description = "Own favorites", body = ApiResponse<FavoriteList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn list_favorites(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<FavoriteList>>> {
    let resp = favorite_service::list_favorites(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/favorites/",
    request_body = FavoriteRequest,
    responses(
        (status = 201, description = "Favorite created", body = ApiResponse<Favorite>),
        (status = 400, description = "Already a favorite"),
        (status = 404, description = "Product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn create_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<FavoriteRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Favorite>>)> {
    let resp = favorite_service::create_favorite(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/favorites/{id}/",
    params(
        ("id" = Uuid, Path, description = "Favorite ID")
    ),
    responses(
        (status = 200, description = "Favorite detail", body = ApiResponse<Favorite>),
        (status = 404, description = "Favorite not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn get_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Favorite>>> {
    let resp = favorite_service::get_favorite(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/favorites/{id}/",
    params(
        ("id" = Uuid, Path, description = "Favorite ID")
    ),
    request_body = FavoriteRequest,
    responses(
        (status = 200, description = "Favorite re-pointed (PATCH behaves the same)", body = ApiResponse<Favorite>),
        (status = 400, description = "Already a favorite"),
        (status = 404, description = "Favorite or product not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn update_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<FavoriteRequest>,
) -> AppResult<Json<ApiResponse<Favorite>>> {
    let resp = favorite_service::update_favorite(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/favorites/{id}/",
    params(
        ("id" = Uuid, Path, description = "Favorite ID")
    ),
    responses(
        (status = 200, description = "Favorite removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Favorite not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Favorites"
)]
pub async fn delete_favorite(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = favorite_service::delete_favorite(&state, &user, id).await?;
    Ok(Json(resp))
}

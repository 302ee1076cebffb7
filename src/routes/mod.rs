use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod cart;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod profile;

// Each module declares full paths. Nesting would drop the trailing slash on
// collection routes (`/cart/` would only match as `/cart`).
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(products::router())
        .merge(profile::router())
        .merge(cart::router())
        .merge(orders::router())
        .merge(favorites::router())
}

use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            AccessToken, AuthResponse, LoginRequest, LogoutRequest, RefreshRequest,
            RegisterRequest,
        },
        cart::{AddToCartRequest, CartList},
        favorites::{FavoriteList, FavoriteProductList, FavoriteRequest, ToggleFavoriteResponse},
        orders::OrderList,
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        profile::{
            DietaryPreferencesRequest, ProfilePictureForm, ProfilePictureResponse,
            UpdateProfileRequest,
        },
    },
    entity::{orders::OrderStatus, products::Category},
    models::{CartLine, CategoryOption, DietaryFlags, Favorite, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, favorites, health, orders, products, profile},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Kainan API", description = "Meal shop backend: accounts, catalog, favorites, cart and orders"),
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::current_user,
        auth::logout,
        auth::refresh,
        profile::update_profile,
        profile::update_dietary_preferences,
        profile::update_picture,
        products::products_by_category,
        products::list_categories,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        favorites::toggle_favorite,
        favorites::favorites_list,
        favorites::list_favorites,
        favorites::create_favorite,
        favorites::get_favorite,
        favorites::update_favorite,
        favorites::delete_favorite,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        orders::list_orders,
        orders::create_order,
        orders::get_order,
    ),
    components(
        schemas(
            User,
            DietaryFlags,
            Product,
            Category,
            CategoryOption,
            Favorite,
            CartLine,
            Order,
            OrderItem,
            OrderStatus,
            RegisterRequest,
            LoginRequest,
            RefreshRequest,
            LogoutRequest,
            AuthResponse,
            AccessToken,
            UpdateProfileRequest,
            DietaryPreferencesRequest,
            ProfilePictureForm,
            ProfilePictureResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            FavoriteRequest,
            FavoriteList,
            FavoriteProductList,
            ToggleFavoriteResponse,
            AddToCartRequest,
            CartList,
            OrderList,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<CartList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login and tokens"),
        (name = "Profile", description = "Profile and dietary preferences"),
        (name = "Products", description = "Catalog and categories"),
        (name = "Favorites", description = "Favorite products"),
        (name = "Cart", description = "Shopping cart"),
        (name = "Orders", description = "Orders placed from the cart"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    entity::{
        favorites, order_items, orders,
        orders::OrderStatus,
        products::{self, Category},
        users,
    },
    storage::{ImageStore, absolute_url},
};

/// Largest amount a `NUMERIC(10, 2)` money column can hold.
pub fn max_amount() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DietaryFlags {
    pub is_vegetarian: bool,
    pub is_vegan: bool,
    pub is_pescatarian: bool,
    pub is_flexitarian: bool,
    pub is_paleo: bool,
    pub is_ketogenic: bool,
    pub is_halal: bool,
    pub is_kosher: bool,
    pub is_fruitarian: bool,
    pub is_gluten_free: bool,
    pub is_dairy_free: bool,
    pub is_organic: bool,
}

impl From<&users::Model> for DietaryFlags {
    fn from(u: &users::Model) -> Self {
        Self {
            is_vegetarian: u.is_vegetarian,
            is_vegan: u.is_vegan,
            is_pescatarian: u.is_pescatarian,
            is_flexitarian: u.is_flexitarian,
            is_paleo: u.is_paleo,
            is_ketogenic: u.is_ketogenic,
            is_halal: u.is_halal,
            is_kosher: u.is_kosher,
            is_fruitarian: u.is_fruitarian,
            is_gluten_free: u.is_gluten_free,
            is_dairy_free: u.is_dairy_free,
            is_organic: u.is_organic,
        }
    }
}

/// Public profile. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    #[serde(flatten)]
    pub dietary: DietaryFlags,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn from_entity(model: users::Model, images: &dyn ImageStore) -> Self {
        let dietary = DietaryFlags::from(&model);
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            full_name: model.full_name,
            phone_number: model.phone_number,
            profile_picture: model
                .profile_picture
                .as_deref()
                .map(|key| absolute_url(images, key)),
            dietary,
            role: model.role,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "10.00")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub available: bool,
    pub category: Category,
    pub category_display: String,
    pub ingredients: Option<String>,
    pub serving_size: Option<String>,
    pub dietary_info: Option<String>,
    /// Only present on catalog reads.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn from_entity(model: products::Model, images: &dyn ImageStore) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            price: model.price,
            image_url: model
                .image_url
                .as_deref()
                .map(|value| absolute_url(images, value)),
            available: model.available,
            category_display: model.category.label().to_string(),
            category: model.category,
            ingredients: model.ingredients,
            serving_size: model.serving_size,
            dietary_info: model.dietary_info,
            is_favorite: None,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }

    pub fn with_favorite(mut self, is_favorite: bool) -> Self {
        self.is_favorite = Some(is_favorite);
        self
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Favorite {
    pub id: Uuid,
    pub product: Product,
    pub created_at: DateTime<Utc>,
}

impl Favorite {
    pub fn from_entity(model: favorites::Model, product: Product) -> Self {
        Self {
            id: model.id,
            product,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

/// Cart line with the product's live values.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Uuid,
    pub product_name: String,
    #[schema(value_type = String, example = "10.00")]
    pub product_price: Decimal,
    pub product_image: Option<String>,
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    #[schema(value_type = String, example = "10.00")]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

impl From<order_items::Model> for OrderItem {
    fn from(model: order_items::Model) -> Self {
        Self {
            id: model.id,
            order_id: model.order_id,
            product_id: model.product_id,
            quantity: model.quantity,
            price: model.price,
            created_at: model.created_at.with_timezone(&Utc),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: OrderStatus,
    #[schema(value_type = String, example = "25.00")]
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    pub fn from_entity(model: orders::Model, items: Vec<OrderItem>, total_amount: Decimal) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            status: model.status,
            total_amount,
            created_at: model.created_at.with_timezone(&Utc),
            items,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryOption {
    pub value: Category,
    pub label: String,
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{entity::products::Category, models::Product};

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String, example = "120.00")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub available: Option<bool>,
    pub category: Option<Category>,
    pub ingredients: Option<String>,
    pub serving_size: Option<String>,
    pub dietary_info: Option<String>,
}

/// Every field optional; PUT and PATCH both apply only what is sent.
#[derive(Deserialize, Debug, Default, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, example = "120.00")]
    pub price: Option<Decimal>,
    pub image_url: Option<String>,
    pub available: Option<bool>,
    pub category: Option<Category>,
    pub ingredients: Option<String>,
    pub serving_size: Option<String>,
    pub dietary_info: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

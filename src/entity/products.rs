use sea_orm::Iterable;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Meal slot a product is sold in. `All` doubles as the catch-all filter value.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, DeriveActiveEnum,
    Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Category {
    #[sea_orm(string_value = "ALL")]
    #[serde(rename = "ALL")]
    All,
    #[sea_orm(string_value = "AGAHAN")]
    #[serde(rename = "AGAHAN")]
    Agahan,
    #[sea_orm(string_value = "TANGHALIAN")]
    #[serde(rename = "TANGHALIAN")]
    Tanghalian,
    #[sea_orm(string_value = "HAPUNAN")]
    #[serde(rename = "HAPUNAN")]
    Hapunan,
    #[sea_orm(string_value = "MERIENDA")]
    #[serde(rename = "MERIENDA")]
    Merienda,
}

impl Category {
    pub fn code(&self) -> &'static str {
        match self {
            Category::All => "ALL",
            Category::Agahan => "AGAHAN",
            Category::Tanghalian => "TANGHALIAN",
            Category::Hapunan => "HAPUNAN",
            Category::Merienda => "MERIENDA",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::All => "all",
            Category::Agahan => "agahan",
            Category::Tanghalian => "tanghalian",
            Category::Hapunan => "hapunan",
            Category::Merienda => "merienda",
        }
    }

    /// Case-insensitive lookup by code.
    pub fn parse(value: &str) -> Option<Self> {
        let upper = value.trim().to_uppercase();
        Category::iter().find(|c| c.code() == upper)
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,
    pub image_url: Option<String>,
    pub available: bool,
    pub category: Category,
    pub ingredients: Option<String>,
    pub serving_size: Option<String>,
    pub dietary_info: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::favorites::Entity")]
    Favorites,
    #[sea_orm(has_many = "super::cart_items::Entity")]
    CartItems,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::favorites::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Favorites.def()
    }
}

impl Related<super::cart_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CartItems.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

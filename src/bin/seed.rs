use std::str::FromStr;

use kainan_api::{
    config::AppConfig,
    db::{OrmConn, create_pool, orm_from_pool, run_migrations},
    entity::{
        Products, Users,
        products::{self, Category},
        users,
    },
    password::hash_password,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    let orm = orm_from_pool(&pool);
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&orm, "juan", "juan@example.com", "juan123", "user").await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    orm: &OrmConn,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    if let Some(existing) = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already exists");
        return Ok(existing.id);
    }

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        username: Set(username.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(password)?),
        full_name: Set(String::new()),
        role: Set(role.to_string()),
        created_at: NotSet,
        ..Default::default()
    }
    .insert(orm)
    .await?;

    println!("Created user {email} (role={role})");
    Ok(user.id)
}

async fn seed_products(orm: &OrmConn) -> anyhow::Result<()> {
    let products = [
        (
            "Tapsilog",
            "Beef tapa, garlic rice and fried egg",
            "120.00",
            Category::Agahan,
            "Beef, rice, garlic, egg",
        ),
        (
            "Champorado",
            "Chocolate rice porridge with milk",
            "75.00",
            Category::Agahan,
            "Glutinous rice, cacao, milk",
        ),
        (
            "Chicken Adobo",
            "Chicken braised in soy sauce and vinegar",
            "150.00",
            Category::Tanghalian,
            "Chicken, soy sauce, vinegar, garlic",
        ),
        (
            "Sinigang na Baboy",
            "Pork in tamarind broth",
            "180.00",
            Category::Tanghalian,
            "Pork, tamarind, kangkong, radish",
        ),
        (
            "Kare-Kare",
            "Oxtail in peanut sauce with bagoong",
            "220.00",
            Category::Hapunan,
            "Oxtail, peanut, eggplant, bagoong",
        ),
        (
            "Pinakbet",
            "Mixed vegetables with shrimp paste",
            "110.00",
            Category::Hapunan,
            "Squash, okra, eggplant, bagoong",
        ),
        (
            "Turon",
            "Banana and jackfruit spring rolls",
            "40.00",
            Category::Merienda,
            "Saba banana, jackfruit, brown sugar",
        ),
        (
            "Halo-Halo",
            "Shaved ice with sweet beans and leche flan",
            "95.00",
            Category::Merienda,
            "Ice, milk, beans, leche flan, ube",
        ),
    ];

    for (name, description, price, category, ingredients) in products {
        let exists = Products::find()
            .filter(products::Column::Name.eq(name))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        products::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            description: Set(Some(description.to_string())),
            price: Set(Decimal::from_str(price)?),
            image_url: Set(None),
            available: Set(true),
            category: Set(category),
            ingredients: Set(Some(ingredients.to_string())),
            serving_size: Set(Some("1 serving".to_string())),
            dietary_info: Set(None),
            created_at: NotSet,
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded products");
    Ok(())
}

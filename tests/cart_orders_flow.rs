mod common;

use kainan_api::{
    dto::cart::AddToCartRequest,
    entity::{
        orders::{Column as OrderCol, Entity as Orders, OrderStatus},
        products::Category,
    },
    error::AppError,
    services::{cart_service, order_service},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, IntoActiveModel, PaginatorTrait, QueryFilter, Set,
};

fn add(product_id: uuid::Uuid, quantity: i32) -> AddToCartRequest {
    AddToCartRequest {
        product_id,
        quantity,
    }
}

#[tokio::test]
async fn repeat_adds_merge_into_one_line() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, _) = common::create_user(&state).await;
    let product = common::create_product(&state, "10.00", Category::Agahan, true).await;

    cart_service::add_to_cart(&state, &user, add(product.id, 2)).await?;
    let line = cart_service::add_to_cart(&state, &user, add(product.id, 3))
        .await?
        .data
        .expect("line");
    assert_eq!(line.quantity, 5);
    assert_eq!(line.product_name, product.name);
    assert_eq!(
        line.product_image.as_deref(),
        Some("http://localhost:3000/media/products/dish.jpg")
    );

    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    Ok(())
}

#[tokio::test]
async fn concurrent_adds_are_not_lost() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, _) = common::create_user(&state).await;
    let product = common::create_product(&state, "10.00", Category::Agahan, true).await;

    let (a, b, c) = tokio::join!(
        cart_service::add_to_cart(&state, &user, add(product.id, 1)),
        cart_service::add_to_cart(&state, &user, add(product.id, 2)),
        cart_service::add_to_cart(&state, &user, add(product.id, 4)),
    );
    a?;
    b?;
    c?;

    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 7);
    Ok(())
}

#[tokio::test]
async fn add_and_remove_validate_input() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, _) = common::create_user(&state).await;
    let product = common::create_product(&state, "10.00", Category::Agahan, true).await;

    let zero = cart_service::add_to_cart(&state, &user, add(product.id, 0)).await;
    assert!(matches!(zero, Err(AppError::BadRequest(_))));
    let unknown = cart_service::add_to_cart(&state, &user, add(uuid::Uuid::new_v4(), 1)).await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    let missing = cart_service::remove_from_cart(&state, &user, product.id).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    cart_service::add_to_cart(&state, &user, add(product.id, 1)).await?;
    cart_service::remove_from_cart(&state, &user, product.id).await?;
    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert!(cart.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_cart_creates_no_order() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, _) = common::create_user(&state).await;

    match order_service::create_order(&state, &user).await {
        Err(AppError::BadRequest(msg)) => assert_eq!(msg, "Your cart is empty"),
        Err(other) => panic!("unexpected error: {other:?}"),
        Ok(_) => panic!("order created from an empty cart"),
    }
    let count = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(count, 0);
    Ok(())
}

#[tokio::test]
async fn order_snapshots_cart_with_frozen_prices() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, _) = common::create_user(&state).await;
    let p1 = common::create_product(&state, "10.00", Category::Tanghalian, true).await;
    let p2 = common::create_product(&state, "5.00", Category::Merienda, true).await;

    cart_service::add_to_cart(&state, &user, add(p1.id, 2)).await?;
    cart_service::add_to_cart(&state, &user, add(p2.id, 1)).await?;

    let order = order_service::create_order(&state, &user)
        .await?
        .data
        .expect("order");
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total_amount, common::dec("25.00"));
    assert_eq!(order.items.len(), 2);
    let line = |id| order.items.iter().find(|i| i.product_id == id).expect("item");
    assert_eq!(line(p1.id).price, common::dec("10.00"));
    assert_eq!(line(p1.id).quantity, 2);
    assert_eq!(line(p2.id).price, common::dec("5.00"));

    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert!(cart.items.is_empty());

    // later price changes leave the order alone
    let mut active = p1.clone().into_active_model();
    active.price = Set(common::dec("99.00"));
    active.update(&state.orm).await?;

    let fetched = order_service::get_order(&state, &user, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(fetched.total_amount, common::dec("25.00"));
    let frozen = fetched
        .items
        .iter()
        .find(|i| i.product_id == p1.id)
        .expect("item");
    assert_eq!(frozen.price, common::dec("10.00"));
    Ok(())
}

#[tokio::test]
async fn orders_are_private_and_newest_first() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, _) = common::create_user(&state).await;
    let (stranger, _) = common::create_user(&state).await;
    let product = common::create_product(&state, "20.00", Category::Hapunan, true).await;

    cart_service::add_to_cart(&state, &user, add(product.id, 1)).await?;
    let first = order_service::create_order(&state, &user).await?.data.expect("order");
    cart_service::add_to_cart(&state, &user, add(product.id, 3)).await?;
    let second = order_service::create_order(&state, &user).await?.data.expect("order");

    let listed = order_service::list_orders(&state, &user)
        .await?
        .data
        .expect("orders");
    let ids: Vec<_> = listed.items.iter().map(|o| o.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(listed.items[0].total_amount, common::dec("60.00"));
    assert_eq!(listed.items[0].items.len(), 1);

    let hidden = order_service::get_order(&state, &stranger, first.id).await;
    assert!(matches!(hidden, Err(AppError::NotFound(_))));
    let none = order_service::list_orders(&state, &stranger)
        .await?
        .data
        .expect("orders");
    assert!(none.items.is_empty());
    Ok(())
}

#[tokio::test]
async fn cart_quantity_overflow_is_rejected() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, _) = common::create_user(&state).await;
    let product = common::create_product(&state, "1.00", Category::Merienda, true).await;

    cart_service::add_to_cart(&state, &user, add(product.id, i32::MAX - 1)).await?;
    let overflow = cart_service::add_to_cart(&state, &user, add(product.id, 2)).await;
    assert!(matches!(overflow, Err(AppError::BadRequest(_))), "{overflow:?}");

    let line = cart_service::add_to_cart(&state, &user, add(product.id, 1))
        .await?
        .data
        .expect("line");
    assert_eq!(line.quantity, cart_service::MAX_LINE_QUANTITY);
    Ok(())
}

#[tokio::test]
async fn oversized_order_total_is_rejected_and_cart_kept() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await else {
        return Ok(());
    };
    let (user, _) = common::create_user(&state).await;
    let product = common::create_product(&state, "99999999.99", Category::Hapunan, true).await;
    cart_service::add_to_cart(&state, &user, add(product.id, 2)).await?;

    let result = order_service::create_order(&state, &user).await;
    assert!(matches!(result, Err(AppError::BadRequest(_))), "{result:?}");

    let count = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    assert_eq!(count, 0);
    let cart = cart_service::get_cart(&state, &user).await?.data.expect("cart");
    assert_eq!(cart.items.len(), 1);
    Ok(())
}

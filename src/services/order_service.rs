use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::{self, AuditAction},
    dto::orders::OrderList,
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::{self, Column as OrderCol, Entity as Orders, OrderStatus},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, max_amount},
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Σ price × quantity.
pub fn order_total(lines: impl IntoIterator<Item = (Decimal, i32)>) -> Decimal {
    lines
        .into_iter()
        .map(|(price, quantity)| price * Decimal::from(quantity))
        .sum()
}

/// Rejects totals the `orders.total_amount` column cannot store.
pub fn ensure_total_fits(total: Decimal) -> AppResult<()> {
    if total > max_amount() {
        return Err(AppError::BadRequest(format!(
            "Order total exceeds the maximum of {}",
            max_amount()
        )));
    }
    Ok(())
}

/// Orders stored with a zero total are priced from their items on read.
pub fn effective_total(stored: Decimal, items: &[OrderItem]) -> Decimal {
    if stored.is_zero() {
        order_total(items.iter().map(|i| (i.price, i.quantity)))
    } else {
        stored
    }
}

fn to_order(model: orders::Model, items: Vec<OrderItem>) -> Order {
    let total = effective_total(model.total_amount, &items);
    Order::from_entity(model, items, total)
}

/// Moves the caller's cart into a new order. Prices are frozen on the items
/// and the cart is emptied in the same transaction.
pub async fn create_order(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Order>> {
    let txn = state.orm.begin().await?;

    let lines = CartItems::find()
        .filter(CartCol::UserId.eq(user.user_id))
        .order_by_asc(CartCol::CreatedAt)
        .lock_exclusive()
        .all(&txn)
        .await?;
    if lines.is_empty() {
        return Err(AppError::BadRequest("Your cart is empty".into()));
    }

    let product_ids: Vec<Uuid> = lines.iter().map(|l| l.product_id).collect();
    let prices: HashMap<Uuid, Decimal> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p.price))
        .collect();

    let mut priced = Vec::with_capacity(lines.len());
    for line in &lines {
        let price = prices
            .get(&line.product_id)
            .copied()
            .ok_or_else(|| AppError::not_found("Product"))?;
        priced.push((line, price));
    }
    let total = order_total(priced.iter().map(|(line, price)| (*price, line.quantity)));
    ensure_total_fits(total)?;

    let order = orders::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        status: Set(OrderStatus::Pending),
        total_amount: Set(total),
        created_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items = Vec::with_capacity(priced.len());
    for (line, price) in priced {
        let item = order_items::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(OrderItem::from(item));
    }

    let line_ids: Vec<Uuid> = lines.iter().map(|l| l.id).collect();
    CartItems::delete_many()
        .filter(CartCol::Id.is_in(line_ids))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(
        order_id = %order.id,
        user_id = %user.user_id,
        total = %total,
        items = items.len(),
        "order created"
    );
    audit::record(
        &state.pool,
        user.user_id,
        AuditAction::OrderCreate,
        serde_json::json!({ "order_id": order.id, "total_amount": total }),
    )
    .await;

    Ok(ApiResponse::single("Order created", to_order(order, items)))
}

async fn items_by_order(
    state: &AppState,
    order_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, Vec<OrderItem>>> {
    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    if order_ids.is_empty() {
        return Ok(grouped);
    }
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?;
    for row in rows {
        grouped.entry(row.order_id).or_default().push(row.into());
    }
    Ok(grouped)
}

pub async fn list_orders(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<OrderList>> {
    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let mut items = items_by_order(state, orders.iter().map(|o| o.id).collect()).await?;
    let orders: Vec<Order> = orders
        .into_iter()
        .map(|order| {
            let lines = items.remove(&order.id).unwrap_or_default();
            to_order(order, lines)
        })
        .collect();

    let meta = Meta::total(orders.len());
    Ok(ApiResponse::success("OK", OrderList { items: orders }, Some(meta)))
}

/// Other users' orders are reported as missing.
pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find_by_id(id)
        .filter(OrderCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let lines = items_by_order(state, vec![order.id])
        .await?
        .remove(&order.id)
        .unwrap_or_default();

    Ok(ApiResponse::single("OK", to_order(order, lines)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("decimal")
    }

    fn item(price: &str, quantity: i32) -> OrderItem {
        OrderItem {
            id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            product_id: Uuid::new_v4(),
            quantity,
            price: dec(price),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn totals_price_times_quantity() {
        let total = order_total(vec![(dec("10.00"), 2), (dec("5.00"), 1)]);
        assert_eq!(total, dec("25.00"));
        assert_eq!(order_total(Vec::new()), Decimal::ZERO);
        assert_eq!(order_total(vec![(dec("0.10"), 3)]), dec("0.30"));
    }

    #[test]
    fn zero_total_is_recomputed_from_items() {
        let items = vec![item("10.00", 2), item("5.00", 1)];
        assert_eq!(effective_total(Decimal::ZERO, &items), dec("25.00"));
    }

    #[test]
    fn totals_beyond_the_money_column_are_rejected() {
        let total = order_total(vec![(dec("99999999.99"), 2)]);
        let err = ensure_total_fits(total).expect_err("too large");
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(ensure_total_fits(dec("99999999.99")).is_ok());
    }

    #[test]
    fn stored_total_wins_when_set() {
        let items = vec![item("10.00", 2)];
        assert_eq!(effective_total(dec("18.50"), &items), dec("18.50"));
        assert_eq!(effective_total(Decimal::ZERO, &[]), Decimal::ZERO);
    }
}

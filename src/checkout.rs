use chrono::Utc;
use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    cart::Cart,
    error::InventoryError,
    models::{NewOrderLineEntity, OrderLineEntity},
    schema::{inventory, orders},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CustomerDetails {
    pub name: String,
    pub mobile: String,
    pub payment_mode: String,
}

/// Convert a cart into order rows and stock decrements, all or nothing.
///
/// Every line of one checkout shares a single timestamp. Each decrement is a
/// guarded single-statement update (`quantity >= qty` in the predicate), so
/// concurrent checkouts against the same sku cannot jointly drive stock
/// negative: the second one matches zero rows and the whole transaction rolls
/// back. A cart entry whose sku has meanwhile been deleted fails the checkout
/// with `InvalidSku`.
///
/// On success the committed rows are returned; the caller clears the cart.
pub async fn commit(
    conn: &mut AsyncPgConnection,
    cart: &Cart,
    customer: &CustomerDetails,
) -> Result<Vec<OrderLineEntity>, InventoryError> {
    if cart.is_empty() {
        return Err(InventoryError::EmptyCart);
    }

    let placed_at = Utc::now();
    conn.transaction(move |conn| {
        Box::pin(async move {
            let mut committed = Vec::with_capacity(cart.len());

            for (sku, line) in cart.iter() {
                let decremented = diesel::update(
                    inventory::table
                        .filter(inventory::sku.eq(sku))
                        .filter(inventory::quantity.ge(line.qty)),
                )
                .set(inventory::quantity.eq(inventory::quantity - line.qty))
                .execute(conn)
                .await?;

                if decremented == 0 {
                    let available: Option<i32> = inventory::table
                        .filter(inventory::sku.eq(sku))
                        .select(inventory::quantity)
                        .first(conn)
                        .await
                        .optional()?;
                    return Err(match available {
                        Some(available) => InventoryError::InsufficientStock {
                            sku: sku.clone(),
                            available,
                        },
                        None => InventoryError::InvalidSku(sku.clone()),
                    });
                }

                let row = diesel::insert_into(orders::table)
                    .values(NewOrderLineEntity {
                        timestamp: placed_at,
                        customer_name: customer.name.clone(),
                        mobile: customer.mobile.clone(),
                        sku: sku.clone(),
                        sp: line.sp,
                        quantity: line.qty,
                        total: line.sp * Decimal::from(line.qty),
                        payment_mode: customer.payment_mode.clone(),
                    })
                    .returning(OrderLineEntity::as_returning())
                    .get_result(conn)
                    .await?;
                committed.push(row);
            }

            Ok::<Vec<OrderLineEntity>, InventoryError>(committed)
        })
    })
    .await
}

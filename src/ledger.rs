use std::collections::HashMap;

use diesel::{ExpressionMethods, QueryDsl, SelectableHelper};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::InventoryError, models::OrderLineEntity, schema::orders};

/// One display bucket of the order history: every line sold to the same
/// `"name | mobile"` pair, newest checkout first, with a running total.
/// Distinct checkouts by the same pair merge into one bucket on purpose.
#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerGroup {
    pub customer: String,
    pub lines: Vec<OrderLineEntity>,
    pub grand_total: Decimal,
}

/// Group rows by customer, preserving the order in which each customer first
/// appears. Rows must already be sorted newest first.
pub fn group_by_customer(rows: Vec<OrderLineEntity>) -> Vec<CustomerGroup> {
    let mut groups: Vec<CustomerGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let key = format!("{} | {}", row.customer_name, row.mobile);
        let slot = match index.get(&key) {
            Some(&slot) => slot,
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(CustomerGroup {
                    customer: key,
                    lines: Vec::new(),
                    grand_total: Decimal::ZERO,
                });
                groups.len() - 1
            }
        };
        groups[slot].grand_total += row.total;
        groups[slot].lines.push(row);
    }

    groups
}

/// The full ledger, newest lines first, bucketed by customer.
pub async fn list_grouped(
    conn: &mut AsyncPgConnection,
) -> Result<Vec<CustomerGroup>, InventoryError> {
    let rows: Vec<OrderLineEntity> = orders::table
        .order_by(orders::timestamp.desc())
        .select(OrderLineEntity::as_select())
        .load(conn)
        .await?;
    Ok(group_by_customer(rows))
}

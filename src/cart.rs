use std::collections::BTreeMap;

use diesel_async::AsyncPgConnection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{catalog, error::InventoryError, models::SkuEntity};

/// One pending line in a cart. `brand` and `sp` are snapshots taken when the
/// sku is first added; later adds of the same sku only bump `qty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub brand: String,
    pub sp: Decimal,
    pub qty: i32,
}

/// A session's pending selection, keyed by sku.
///
/// The cart is an explicit value: the caller holds it (typically serialized
/// into its session store as one JSON object) and passes it into each
/// operation. The service keeps no cart state between calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    lines: BTreeMap<String, CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CartLine)> {
        self.lines.iter()
    }

    pub fn quantity_of(&self, sku: &str) -> i32 {
        self.lines.get(sku).map(|line| line.qty).unwrap_or(0)
    }

    /// Accumulate `qty` of `item` against live stock.
    ///
    /// The stock comparison covers what the cart already holds, so repeated
    /// adds cannot creep past the available quantity. On failure the cart is
    /// left untouched. The check is advisory; the checkout transaction
    /// re-validates authoritatively.
    pub fn try_add(&mut self, item: &SkuEntity, qty: i32) -> Result<(), InventoryError> {
        if qty <= 0 {
            return Err(InventoryError::InvalidQuantity(qty));
        }

        let existing = self.quantity_of(&item.sku);
        if existing + qty > item.quantity {
            return Err(InventoryError::InsufficientStock {
                sku: item.sku.clone(),
                available: item.quantity,
            });
        }

        let line = self
            .lines
            .entry(item.sku.clone())
            .or_insert_with(|| CartLine {
                brand: item.brand.clone(),
                sp: item.finalsp,
                qty: 0,
            });
        line.qty += qty;
        Ok(())
    }

    /// Drop the entry for `sku`. No-op if absent.
    pub fn remove(&mut self, sku: &str) {
        self.lines.remove(sku);
    }

    /// Sum of `sp * qty` over all lines. Pure; no store access.
    pub fn total(&self) -> Decimal {
        self.lines
            .values()
            .map(|line| line.sp * Decimal::from(line.qty))
            .sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

/// Resolve `sku` against the catalog and accumulate it into the cart.
pub async fn add(
    conn: &mut AsyncPgConnection,
    cart: &mut Cart,
    sku: &str,
    qty: i32,
) -> Result<(), InventoryError> {
    let item = catalog::find_sku(conn, sku).await?;
    cart.try_add(&item, qty)
}

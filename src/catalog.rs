use std::collections::BTreeMap;

use diesel::{
    ExpressionMethods, OptionalExtension, QueryDsl, SelectableHelper,
    result::{DatabaseErrorKind, Error as DieselError},
};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    error::InventoryError,
    models::{NewSkuEntity, SkuEntity},
    schema::inventory,
};

/// All in-stock SKUs, ordered by brand. This is what a storefront lists.
pub async fn list_available(conn: &mut AsyncPgConnection) -> Result<Vec<SkuEntity>, InventoryError> {
    let items = inventory::table
        .filter(inventory::quantity.gt(0))
        .order_by(inventory::brand.asc())
        .select(SkuEntity::as_select())
        .load(conn)
        .await?;
    Ok(items)
}

/// The full table, out-of-stock rows included, ordered by brand then sku.
pub async fn list_all(conn: &mut AsyncPgConnection) -> Result<Vec<SkuEntity>, InventoryError> {
    let items = inventory::table
        .order_by((inventory::brand.asc(), inventory::sku.asc()))
        .select(SkuEntity::as_select())
        .load(conn)
        .await?;
    Ok(items)
}

/// Brand -> sku index over an already-fetched listing.
pub fn skus_by_brand(items: &[SkuEntity]) -> BTreeMap<String, Vec<String>> {
    let mut index: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for item in items {
        index
            .entry(item.brand.clone())
            .or_default()
            .push(item.sku.clone());
    }
    index
}

pub async fn find_sku(
    conn: &mut AsyncPgConnection,
    sku: &str,
) -> Result<SkuEntity, InventoryError> {
    inventory::table
        .filter(inventory::sku.eq(sku))
        .select(SkuEntity::as_select())
        .first(conn)
        .await
        .optional()?
        .ok_or_else(|| InventoryError::InvalidSku(sku.to_owned()))
}

/// Insert a brand-new SKU. A `sku` collision surfaces as `DuplicateSku` so
/// the caller can report it and carry on.
pub async fn insert_sku(
    conn: &mut AsyncPgConnection,
    new_sku: NewSkuEntity,
) -> Result<SkuEntity, InventoryError> {
    diesel::insert_into(inventory::table)
        .values(&new_sku)
        .returning(SkuEntity::as_returning())
        .get_result(conn)
        .await
        .map_err(|err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                InventoryError::DuplicateSku(new_sku.sku.clone())
            }
            other => other.into(),
        })
}

/// Manual restock: add `delta` to the row matching brand + sku. Returns the
/// affected-row count; matching nothing is not an error here, callers that
/// care must check the count.
pub async fn restock(
    conn: &mut AsyncPgConnection,
    brand: &str,
    sku: &str,
    delta: i32,
) -> Result<usize, InventoryError> {
    if delta <= 0 {
        return Err(InventoryError::InvalidQuantity(delta));
    }

    let affected = diesel::update(
        inventory::table
            .filter(inventory::brand.eq(brand))
            .filter(inventory::sku.eq(sku)),
    )
    .set(inventory::quantity.eq(inventory::quantity + delta))
    .execute(conn)
    .await?;
    Ok(affected)
}

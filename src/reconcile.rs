use diesel::{ExpressionMethods, upsert::excluded};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::{error::InventoryError, models::NewSkuEntity, schema::inventory};

/// One row from the bulk feed, still unparsed. The transport (CSV upload,
/// spreadsheet export, ...) is the feed reader's concern; by the time rows
/// reach us they are plain string fields. Aliases match the column headers
/// the stock feeds actually ship.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RawSkuRow {
    #[serde(alias = "Brand")]
    pub brand: String,
    #[serde(alias = "Category")]
    pub category: String,
    #[serde(alias = "SKU")]
    pub sku: String,
    #[serde(alias = "MRP")]
    pub mrp: String,
    #[serde(alias = "FinalSP")]
    pub finalsp: String,
    #[serde(alias = "Quantity")]
    pub quantity: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReconcileSummary {
    pub updated: usize,
    pub skipped: usize,
}

fn parse_row(row: &RawSkuRow) -> Result<NewSkuEntity, InventoryError> {
    let sku = row.sku.trim();
    if sku.is_empty() {
        return Err(InventoryError::MalformedRow("empty sku".to_owned()));
    }
    let brand = row.brand.trim();
    if brand.is_empty() {
        return Err(InventoryError::MalformedRow("empty brand".to_owned()));
    }

    let mrp: Decimal = row
        .mrp
        .trim()
        .parse()
        .map_err(|_| InventoryError::MalformedRow(format!("bad mrp `{}`", row.mrp)))?;
    let finalsp: Decimal = row
        .finalsp
        .trim()
        .parse()
        .map_err(|_| InventoryError::MalformedRow(format!("bad finalsp `{}`", row.finalsp)))?;
    let quantity: i32 = row
        .quantity
        .trim()
        .parse()
        .map_err(|_| InventoryError::MalformedRow(format!("bad quantity `{}`", row.quantity)))?;

    if mrp < Decimal::ZERO || finalsp < Decimal::ZERO {
        return Err(InventoryError::MalformedRow("negative price".to_owned()));
    }
    if quantity < 0 {
        return Err(InventoryError::MalformedRow("negative quantity".to_owned()));
    }

    Ok(NewSkuEntity {
        brand: brand.to_owned(),
        category: row.category.trim().to_owned(),
        sku: sku.to_owned(),
        mrp,
        finalsp,
        quantity,
    })
}

/// Merge a bulk feed into the inventory.
///
/// New skus are inserted. Existing skus get brand/category/mrp/finalsp
/// overwritten while the incoming quantity is ADDED to the stored one; a
/// restock feed must never clobber stock counted since the last export.
/// Malformed rows are skipped and counted, never fatal. A storage failure
/// aborts the remaining rows: everything applied before it stays applied,
/// which is why the abort is logged with the running counts.
pub async fn reconcile(
    conn: &mut AsyncPgConnection,
    rows: Vec<RawSkuRow>,
) -> Result<ReconcileSummary, InventoryError> {
    let mut summary = ReconcileSummary {
        updated: 0,
        skipped: 0,
    };

    for row in rows {
        let parsed = match parse_row(&row) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(sku = %row.sku, %err, "Skipping feed row");
                summary.skipped += 1;
                continue;
            }
        };

        let applied = diesel::insert_into(inventory::table)
            .values(&parsed)
            .on_conflict(inventory::sku)
            .do_update()
            .set((
                inventory::brand.eq(excluded(inventory::brand)),
                inventory::category.eq(excluded(inventory::category)),
                inventory::mrp.eq(excluded(inventory::mrp)),
                inventory::finalsp.eq(excluded(inventory::finalsp)),
                inventory::quantity.eq(inventory::quantity + excluded(inventory::quantity)),
            ))
            .execute(conn)
            .await;

        if let Err(err) = applied {
            error!(
                sku = %parsed.sku,
                updated = summary.updated,
                skipped = summary.skipped,
                "Feed import aborted mid-batch; rows applied so far stay applied"
            );
            return Err(err.into());
        }
        summary.updated += 1;
    }

    Ok(summary)
}

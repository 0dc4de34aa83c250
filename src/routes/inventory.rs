use std::collections::BTreeMap;

use anyhow::Context;
use axum::{Json, extract::State, response::IntoResponse};
use rust_decimal::Decimal;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use serde::{Deserialize, Serialize};

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    catalog,
    error::InventoryError,
    models::{NewSkuEntity, SkuEntity},
    reconcile::{self, RawSkuRow, ReconcileSummary},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/inventory",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(list_available))
            .routes(utoipa_axum::routes!(catalog_overview))
            .routes(utoipa_axum::routes!(add_sku))
            .routes(utoipa_axum::routes!(restock))
            .routes(utoipa_axum::routes!(reconcile_feed)),
    )
}

/// List every sku with stock on hand, ordered by brand.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Inventory"],
    responses(
        (status = 200, description = "List in-stock skus", body = StdResponse<Vec<SkuEntity>, String>)
    )
)]
async fn list_available(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let items = catalog::list_available(&mut conn).await?;

    Ok(StdResponse {
        data: Some(items),
        message: Some("Get inventory successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct CatalogOverviewRes {
    items: Vec<SkuEntity>,
    brands: Vec<String>,
    skus_by_brand: BTreeMap<String, Vec<String>>,
}

/// Management view: the full table (out-of-stock included) plus a brand
/// index for pick lists.
#[utoipa::path(
    get,
    path = "/catalog",
    tags = ["Inventory"],
    responses(
        (status = 200, description = "Full catalog with brand index", body = StdResponse<CatalogOverviewRes, String>)
    )
)]
async fn catalog_overview(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let items = catalog::list_all(&mut conn).await?;
    let skus_by_brand = catalog::skus_by_brand(&items);
    let brands = skus_by_brand.keys().cloned().collect();

    Ok(StdResponse {
        data: Some(CatalogOverviewRes {
            items,
            brands,
            skus_by_brand,
        }),
        message: Some("Get catalog successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct AddSkuReq {
    brand: String,
    category: String,
    sku: String,
    mrp: Decimal,
    finalsp: Decimal,
    quantity: i32,
}

/// Manually add a brand-new sku.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Inventory"],
    request_body = AddSkuReq,
    responses(
        (status = 200, description = "Created sku successfully", body = StdResponse<SkuEntity, String>),
        (status = 409, description = "Sku already exists", body = StdResponse<String, String>)
    )
)]
async fn add_sku(
    State(state): State<AppState>,
    Json(body): Json<AddSkuReq>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let created = match catalog::insert_sku(
        &mut conn,
        NewSkuEntity {
            brand: body.brand,
            category: body.category,
            sku: body.sku,
            mrp: body.mrp,
            finalsp: body.finalsp,
            quantity: body.quantity,
        },
    )
    .await
    {
        Ok(created) => created,
        Err(err @ InventoryError::DuplicateSku(_)) => {
            tracing::warn!(%err, "Manual sku add rejected");
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };

    Ok(StdResponse {
        data: Some(created),
        message: Some("Created sku successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct RestockReq {
    brand: String,
    sku: String,
    qty: i32,
}

#[derive(Serialize, ToSchema)]
struct RestockRes {
    affected: usize,
}

/// Manually bump the quantity of an existing sku, matched by brand + sku.
#[utoipa::path(
    patch,
    path = "/restock",
    tags = ["Inventory"],
    request_body = RestockReq,
    responses(
        (status = 200, description = "Restocked successfully", body = StdResponse<RestockRes, String>),
        (status = 404, description = "No matching sku", body = StdResponse<String, String>)
    )
)]
async fn restock(
    State(state): State<AppState>,
    Json(body): Json<RestockReq>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let affected = catalog::restock(&mut conn, &body.brand, &body.sku, body.qty).await?;
    if affected == 0 {
        return Err(AppError::NotFound);
    }

    Ok(StdResponse {
        data: Some(RestockRes { affected }),
        message: Some("Restocked successfully"),
    })
}

/// Bulk-import a stock feed. Existing skus merge quantities; malformed rows
/// are skipped and counted.
#[utoipa::path(
    post,
    path = "/reconcile",
    tags = ["Inventory"],
    request_body = Vec<RawSkuRow>,
    responses(
        (status = 200, description = "Feed reconciled", body = StdResponse<ReconcileSummary, String>)
    )
)]
async fn reconcile_feed(
    State(state): State<AppState>,
    Json(rows): Json<Vec<RawSkuRow>>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let summary = reconcile::reconcile(&mut conn, rows).await?;

    Ok(StdResponse {
        data: Some(summary),
        message: Some("Reconciled feed successfully"),
    })
}

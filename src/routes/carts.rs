use anyhow::Context;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use rust_decimal::Decimal;
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use serde::{Deserialize, Serialize};

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    cart::{self, Cart},
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/carts",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(add_item))
            .routes(utoipa_axum::routes!(remove_item))
            .routes(utoipa_axum::routes!(cart_total)),
    )
}

#[derive(Deserialize, ToSchema)]
struct AddItemReq {
    cart: Cart,
    sku: String,
    qty: i32,
}

#[derive(Serialize, ToSchema)]
struct CartRes {
    cart: Cart,
    total: Decimal,
}

/// Add `qty` of a sku to the cart the caller sent, validated against live
/// stock. The updated cart comes back for the caller's session store.
#[utoipa::path(
    post,
    path = "/items",
    tags = ["Carts"],
    request_body = AddItemReq,
    responses(
        (status = 200, description = "Added to cart", body = StdResponse<CartRes, String>),
        (status = 400, description = "Unknown sku or bad quantity", body = StdResponse<String, String>),
        (status = 409, description = "Not enough stock", body = StdResponse<String, String>)
    )
)]
async fn add_item(
    State(state): State<AppState>,
    Json(body): Json<AddItemReq>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let mut cart = body.cart;
    cart::add(&mut conn, &mut cart, &body.sku, body.qty).await?;

    Ok(StdResponse {
        data: Some(CartRes {
            total: cart.total(),
            cart,
        }),
        message: Some("Added to cart successfully"),
    })
}

/// Drop a sku from the cart. Removing an absent sku is a no-op.
#[utoipa::path(
    delete,
    path = "/items/{sku}",
    tags = ["Carts"],
    params(
        ("sku" = String, Path, description = "Sku to remove")
    ),
    request_body = Cart,
    responses(
        (status = 200, description = "Removed from cart", body = StdResponse<CartRes, String>)
    )
)]
async fn remove_item(
    Path(sku): Path<String>,
    Json(mut cart): Json<Cart>,
) -> Result<impl IntoResponse, AppError> {
    cart.remove(&sku);

    Ok(StdResponse {
        data: Some(CartRes {
            total: cart.total(),
            cart,
        }),
        message: Some("Removed from cart successfully"),
    })
}

#[derive(Serialize, ToSchema)]
struct CartTotalRes {
    total: Decimal,
}

/// Price a cart without touching it.
#[utoipa::path(
    post,
    path = "/total",
    tags = ["Carts"],
    request_body = Cart,
    responses(
        (status = 200, description = "Cart total", body = StdResponse<CartTotalRes, String>)
    )
)]
async fn cart_total(Json(cart): Json<Cart>) -> Result<impl IntoResponse, AppError> {
    Ok(StdResponse {
        data: Some(CartTotalRes {
            total: cart.total(),
        }),
        message: Some("Computed cart total successfully"),
    })
}

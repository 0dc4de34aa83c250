use anyhow::Context;
use axum::{Json, extract::State, response::IntoResponse};
use utoipa::ToSchema;
use utoipa_axum::router::OpenApiRouter;

use serde::{Deserialize, Serialize};

use crate::{
    app_error::{AppError, StdResponse},
    app_state::AppState,
    cart::Cart,
    checkout::{self, CustomerDetails},
    ledger::{self, CustomerGroup},
    models::OrderLineEntity,
};

pub fn routes_with_openapi() -> OpenApiRouter<AppState> {
    utoipa_axum::router::OpenApiRouter::new().nest(
        "/orders",
        OpenApiRouter::new()
            .routes(utoipa_axum::routes!(list_orders))
            .routes(utoipa_axum::routes!(submit_order)),
    )
}

/// The order history, grouped per customer, newest first.
#[utoipa::path(
    get,
    path = "/",
    tags = ["Orders"],
    responses(
        (status = 200, description = "Grouped order history", body = StdResponse<Vec<CustomerGroup>, String>)
    )
)]
async fn list_orders(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let groups = ledger::list_grouped(&mut conn).await?;

    Ok(StdResponse {
        data: Some(groups),
        message: Some("Get orders successfully"),
    })
}

#[derive(Deserialize, ToSchema)]
struct SubmitOrderReq {
    cart: Cart,
    name: String,
    mobile: String,
    payment_mode: String,
}

#[derive(Serialize, ToSchema)]
struct SubmitOrderRes {
    lines: Vec<OrderLineEntity>,
    cart: Cart,
}

/// Commit the cart as one checkout: order rows plus stock decrements, all or
/// nothing. The cleared cart comes back for the caller's session store.
#[utoipa::path(
    post,
    path = "/",
    tags = ["Orders"],
    request_body = SubmitOrderReq,
    responses(
        (status = 200, description = "Order committed", body = StdResponse<SubmitOrderRes, String>),
        (status = 400, description = "Empty cart or stale sku", body = StdResponse<String, String>),
        (status = 409, description = "A line would oversell", body = StdResponse<String, String>)
    )
)]
async fn submit_order(
    State(state): State<AppState>,
    Json(body): Json<SubmitOrderReq>,
) -> Result<impl IntoResponse, AppError> {
    let mut conn = state
        .db_pool
        .get()
        .await
        .context("Failed to obtain a DB connection pool")?;

    let customer = CustomerDetails {
        name: body.name,
        mobile: body.mobile,
        payment_mode: body.payment_mode,
    };
    let lines = checkout::commit(&mut conn, &body.cart, &customer).await?;

    let mut cart = body.cart;
    cart.clear();

    Ok(StdResponse {
        data: Some(SubmitOrderRes { lines, cart }),
        message: Some("Order committed successfully"),
    })
}

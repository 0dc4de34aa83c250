use thiserror::Error;

/// Typed failures of the inventory/cart/order core.
///
/// `InsufficientStock` is raised in two places with different weight: the
/// cart-time check is advisory (stock can still move before checkout), the
/// commit-time check inside the checkout transaction is authoritative.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("unknown sku `{0}`")]
    InvalidSku(String),

    #[error("insufficient stock for `{sku}`: {available} available")]
    InsufficientStock { sku: String, available: i32 },

    #[error("quantity must be a positive integer, got {0}")]
    InvalidQuantity(i32),

    #[error("malformed feed row: {0}")]
    MalformedRow(String),

    #[error("sku `{0}` already exists")]
    DuplicateSku(String),

    #[error("cart is empty")]
    EmptyCart,

    #[error("store unavailable")]
    StoreUnavailable(#[from] diesel::result::Error),
}

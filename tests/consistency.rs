//! Postgres-backed integration tests for the inventory/cart/order core.
//!
//! These need a migrated database. Point `DATABASE_URL` at a disposable
//! Postgres (run the service once, or `diesel migration run`) and then:
//!
//! ```bash
//! cargo test -- --ignored
//! ```
//!
//! Every test runs inside `begin_test_transaction`, so nothing is left
//! behind between runs.

use diesel_async::{AsyncConnection, AsyncPgConnection};
use kirana_posservice::{
    cart::{self, Cart},
    catalog,
    checkout::{self, CustomerDetails},
    error::InventoryError,
    ledger,
    models::{NewSkuEntity, SkuEntity},
    reconcile::{self, RawSkuRow},
};
use rust_decimal::Decimal;

async fn connect() -> AsyncPgConnection {
    let url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for integration tests");
    let mut conn = AsyncPgConnection::establish(&url)
        .await
        .expect("failed to connect to Postgres");
    conn.begin_test_transaction()
        .await
        .expect("failed to open a test transaction");
    conn
}

fn new_sku(brand: &str, sku: &str, quantity: i32, finalsp: Decimal) -> NewSkuEntity {
    NewSkuEntity {
        brand: brand.to_owned(),
        category: "soap".to_owned(),
        sku: sku.to_owned(),
        mrp: finalsp + Decimal::ONE,
        finalsp,
        quantity,
    }
}

fn raw_row(brand: &str, sku: &str, mrp: &str, finalsp: &str, quantity: &str) -> RawSkuRow {
    RawSkuRow {
        brand: brand.to_owned(),
        category: "soap".to_owned(),
        sku: sku.to_owned(),
        mrp: mrp.to_owned(),
        finalsp: finalsp.to_owned(),
        quantity: quantity.to_owned(),
    }
}

fn customer(name: &str, mobile: &str) -> CustomerDetails {
    CustomerDetails {
        name: name.to_owned(),
        mobile: mobile.to_owned(),
        payment_mode: "cash".to_owned(),
    }
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_commit_decrements_stock_and_appends_ledger() {
    let mut conn = connect().await;
    let sp = Decimal::new(4999, 2);
    catalog::insert_sku(&mut conn, new_sku("Dove", "DV-1", 5, sp))
        .await
        .unwrap();

    let mut cart = Cart::new();
    cart::add(&mut conn, &mut cart, "DV-1", 3).await.unwrap();

    let lines = checkout::commit(&mut conn, &cart, &customer("Jane", "555-1"))
        .await
        .unwrap();

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].quantity, 3);
    assert_eq!(lines[0].total, sp * Decimal::from(3));

    let after = catalog::find_sku(&mut conn, "DV-1").await.unwrap();
    assert_eq!(after.quantity, 2);

    let groups = ledger::list_grouped(&mut conn).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].customer, "Jane | 555-1");
    assert_eq!(groups[0].grand_total, sp * Decimal::from(3));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_commit_rolls_back_whole_checkout_when_one_line_would_oversell() {
    let mut conn = connect().await;
    catalog::insert_sku(&mut conn, new_sku("Dove", "A", 5, Decimal::new(1000, 2)))
        .await
        .unwrap();
    catalog::insert_sku(&mut conn, new_sku("Lux", "B", 1, Decimal::new(2000, 2)))
        .await
        .unwrap();

    // Both adds pass the advisory check while B still has stock.
    let mut cart = Cart::new();
    cart::add(&mut conn, &mut cart, "A", 2).await.unwrap();
    cart::add(&mut conn, &mut cart, "B", 1).await.unwrap();

    // Another checkout takes the last B before this cart commits.
    let mut rival = Cart::new();
    cart::add(&mut conn, &mut rival, "B", 1).await.unwrap();
    checkout::commit(&mut conn, &rival, &customer("Bob", "555-2"))
        .await
        .unwrap();

    let err = checkout::commit(&mut conn, &cart, &customer("Jane", "555-1"))
        .await
        .unwrap_err();
    match err {
        InventoryError::InsufficientStock { sku, available } => {
            assert_eq!(sku, "B");
            assert_eq!(available, 0);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    // A's decrement was rolled back and no line of the failed checkout is in
    // the ledger.
    let a = catalog::find_sku(&mut conn, "A").await.unwrap();
    assert_eq!(a.quantity, 5);

    let groups = ledger::list_grouped(&mut conn).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].customer, "Bob | 555-2");
    assert_eq!(groups[0].lines.len(), 1);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_commit_rejects_empty_cart() {
    let mut conn = connect().await;
    let err = checkout::commit(&mut conn, &Cart::new(), &customer("Jane", "555-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::EmptyCart));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_commit_shares_one_timestamp_across_lines() {
    let mut conn = connect().await;
    catalog::insert_sku(&mut conn, new_sku("Dove", "A", 5, Decimal::ONE))
        .await
        .unwrap();
    catalog::insert_sku(&mut conn, new_sku("Lux", "B", 5, Decimal::TWO))
        .await
        .unwrap();

    let mut cart = Cart::new();
    cart::add(&mut conn, &mut cart, "A", 1).await.unwrap();
    cart::add(&mut conn, &mut cart, "B", 2).await.unwrap();

    let lines = checkout::commit(&mut conn, &cart, &customer("Jane", "555-1"))
        .await
        .unwrap();

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].timestamp, lines[1].timestamp);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_commit_with_stale_cart_entry_fails_whole_checkout() {
    let mut conn = connect().await;
    catalog::insert_sku(&mut conn, new_sku("Dove", "A", 5, Decimal::ONE))
        .await
        .unwrap();

    // A cart entry for a sku that never existed (e.g. deleted after the add).
    let mut cart = Cart::new();
    cart::add(&mut conn, &mut cart, "A", 1).await.unwrap();
    let ghost = SkuEntity {
        id: 0,
        brand: "Ghost".to_owned(),
        category: "soap".to_owned(),
        sku: "GONE".to_owned(),
        mrp: Decimal::TWO,
        finalsp: Decimal::ONE,
        quantity: 5,
    };
    cart.try_add(&ghost, 1).unwrap();

    let err = checkout::commit(&mut conn, &cart, &customer("Jane", "555-1"))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::InvalidSku(sku) if sku == "GONE"));

    let a = catalog::find_sku(&mut conn, "A").await.unwrap();
    assert_eq!(a.quantity, 5);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_reconcile_merges_quantity_and_overwrites_fields() {
    let mut conn = connect().await;
    catalog::insert_sku(&mut conn, new_sku("Dove", "DV-1", 7, Decimal::new(8999, 2)))
        .await
        .unwrap();

    let summary = reconcile::reconcile(
        &mut conn,
        vec![
            raw_row("Dove Fresh", "DV-1", "110.00", "95.00", "10"),
            raw_row("Lux", "LX-1", "50.00", "45.00", "4"),
        ],
    )
    .await
    .unwrap();

    assert_eq!(summary.updated, 2);
    assert_eq!(summary.skipped, 0);

    let merged = catalog::find_sku(&mut conn, "DV-1").await.unwrap();
    assert_eq!(merged.quantity, 17);
    assert_eq!(merged.brand, "Dove Fresh");
    assert_eq!(merged.mrp, Decimal::new(11000, 2));
    assert_eq!(merged.finalsp, Decimal::new(9500, 2));

    let inserted = catalog::find_sku(&mut conn, "LX-1").await.unwrap();
    assert_eq!(inserted.quantity, 4);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_reconcile_skips_malformed_rows_and_keeps_going() {
    let mut conn = connect().await;

    let summary = reconcile::reconcile(
        &mut conn,
        vec![
            raw_row("Dove", "DV-1", "100.00", "89.99", "12"),
            raw_row("Dove", "DV-2", "not-a-price", "89.99", "12"),
            raw_row("Lux", "LX-1", "50.00", "45.00", "4"),
        ],
    )
    .await
    .unwrap();

    assert_eq!(summary.updated, 2);
    assert_eq!(summary.skipped, 1);

    assert!(catalog::find_sku(&mut conn, "DV-2").await.is_err());
    assert!(catalog::find_sku(&mut conn, "LX-1").await.is_ok());
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_duplicate_sku_insert_is_reported() {
    let mut conn = connect().await;
    catalog::insert_sku(&mut conn, new_sku("Dove", "DV-1", 5, Decimal::ONE))
        .await
        .unwrap();

    let err = catalog::insert_sku(&mut conn, new_sku("Lux", "DV-1", 9, Decimal::TWO))
        .await
        .unwrap_err();
    assert!(matches!(err, InventoryError::DuplicateSku(sku) if sku == "DV-1"));

    // The first row is untouched.
    let kept = catalog::find_sku(&mut conn, "DV-1").await.unwrap();
    assert_eq!(kept.brand, "Dove");
    assert_eq!(kept.quantity, 5);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_restock_reports_affected_rows() {
    let mut conn = connect().await;
    catalog::insert_sku(&mut conn, new_sku("Dove", "DV-1", 5, Decimal::ONE))
        .await
        .unwrap();

    let affected = catalog::restock(&mut conn, "Dove", "DV-1", 3).await.unwrap();
    assert_eq!(affected, 1);
    let after = catalog::find_sku(&mut conn, "DV-1").await.unwrap();
    assert_eq!(after.quantity, 8);

    // Brand must match too; a miss is zero rows, not an error.
    let missed = catalog::restock(&mut conn, "Lux", "DV-1", 3).await.unwrap();
    assert_eq!(missed, 0);
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_cart_add_rejects_unknown_sku() {
    let mut conn = connect().await;
    let mut cart = Cart::new();

    let err = cart::add(&mut conn, &mut cart, "NOPE", 1).await.unwrap_err();
    assert!(matches!(err, InventoryError::InvalidSku(sku) if sku == "NOPE"));
    assert!(cart.is_empty());
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_two_checkouts_by_same_customer_share_one_ledger_group() {
    let mut conn = connect().await;
    let sp = Decimal::new(1000, 2);
    catalog::insert_sku(&mut conn, new_sku("Dove", "DV-1", 10, sp))
        .await
        .unwrap();

    for qty in [2, 3] {
        let mut cart = Cart::new();
        cart::add(&mut conn, &mut cart, "DV-1", qty).await.unwrap();
        checkout::commit(&mut conn, &cart, &customer("Jane", "555-1"))
            .await
            .unwrap();
    }

    let groups = ledger::list_grouped(&mut conn).await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].lines.len(), 2);
    assert_eq!(groups[0].grand_total, sp * Decimal::from(5));
}

#[tokio::test]
#[ignore = "requires a migrated Postgres (set DATABASE_URL)"]
async fn test_list_available_hides_sold_out_skus_and_sorts_by_brand() {
    let mut conn = connect().await;
    catalog::insert_sku(&mut conn, new_sku("Zed", "Z-1", 2, Decimal::ONE))
        .await
        .unwrap();
    catalog::insert_sku(&mut conn, new_sku("Alp", "A-1", 1, Decimal::ONE))
        .await
        .unwrap();

    // Sell out A-1.
    let mut cart = Cart::new();
    cart::add(&mut conn, &mut cart, "A-1", 1).await.unwrap();
    checkout::commit(&mut conn, &cart, &customer("Jane", "555-1"))
        .await
        .unwrap();

    let available = catalog::list_available(&mut conn).await.unwrap();
    let skus: Vec<&str> = available.iter().map(|item| item.sku.as_str()).collect();
    assert!(!skus.contains(&"A-1"));
    assert!(skus.contains(&"Z-1"));

    let brands: Vec<&str> = available.iter().map(|item| item.brand.as_str()).collect();
    let mut sorted = brands.clone();
    sorted.sort();
    assert_eq!(brands, sorted);
}

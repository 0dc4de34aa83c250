use chrono::{DateTime, Utc};
use diesel::{
    Selectable,
    prelude::{Identifiable, Insertable, Queryable},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Inventory

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::inventory)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SkuEntity {
    pub id: i32,
    pub brand: String,
    pub category: String,
    pub sku: String,
    pub mrp: Decimal,
    pub finalsp: Decimal,
    pub quantity: i32,
}

#[derive(Insertable, Deserialize, Debug, Clone, ToSchema)]
#[diesel(table_name = crate::schema::inventory)]
pub struct NewSkuEntity {
    pub brand: String,
    pub category: String,
    pub sku: String,
    pub mrp: Decimal,
    pub finalsp: Decimal,
    pub quantity: i32,
}

// Orders

#[derive(Queryable, Selectable, Identifiable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderLineEntity {
    pub id: i32,
    pub timestamp: DateTime<Utc>,
    pub customer_name: String,
    pub mobile: String,
    pub sku: String,
    pub sp: Decimal,
    pub quantity: i32,
    pub total: Decimal,
    pub payment_mode: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::schema::orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewOrderLineEntity {
    pub timestamp: DateTime<Utc>,
    pub customer_name: String,
    pub mobile: String,
    pub sku: String,
    pub sp: Decimal,
    pub quantity: i32,
    pub total: Decimal,
    pub payment_mode: String,
}

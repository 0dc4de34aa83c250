use anyhow::{Context, Result};
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, bb8::Pool},
};

pub type DbPool = Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DbPool,
}

impl AppState {
    pub async fn init(database_url: &str) -> Result<Self> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let db_pool = Pool::builder()
            .build(manager)
            .await
            .context("Failed to build a DB connection pool")?;
        Ok(Self { db_pool })
    }
}

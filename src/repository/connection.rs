use crate::repository::DbPool;
use anyhow::Result;

pub async fn establish_connection(database_url: &str) -> Result<DbPool> {
    // Ensure the database URL has the correct format
    let db_url = if database_url.starts_with("sqlite:") {
        database_url.to_string()
    } else {
        format!("sqlite:{}", database_url)
    };

    // Create connection with create_if_missing option
    let connection_string = format!("{}?mode=rwc", db_url);
    let pool = sqlx::SqlitePool::connect(&connection_string).await?;

    sqlx::query(
        r#"
        -- Resumption state, one row per failed pipeline
        CREATE TABLE IF NOT EXISTS pipeline_failure_state (
            pipeline_name TEXT PRIMARY KEY,
            phase TEXT NOT NULL,
            observed_at INTEGER NOT NULL
        );

        -- Warehouse tables fed by the bulk loader
        CREATE TABLE IF NOT EXISTS product_info (
            upc TEXT NOT NULL,
            name TEXT,
            image TEXT,
            thumbnail TEXT,
            short_description TEXT,
            long_description TEXT,
            customer_review_count INTEGER,
            customer_review_average TEXT,
            vendor TEXT NOT NULL,
            category_path TEXT,
            PRIMARY KEY (upc, vendor)
        );

        CREATE TABLE IF NOT EXISTS product_prices (
            ds TEXT NOT NULL,
            upc TEXT NOT NULL,
            regular_price REAL NOT NULL,
            sale_price REAL NOT NULL,
            vendor TEXT NOT NULL,
            PRIMARY KEY (ds, upc, vendor)
        );

        CREATE INDEX IF NOT EXISTS idx_product_prices_upc ON product_prices(upc);
        "#,
    )
    .execute(&pool)
    .await?;

    Ok(pool)
}

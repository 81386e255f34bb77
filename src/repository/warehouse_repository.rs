use crate::error::Result;
use crate::models::{ProductInfo, ProductPrice};
use crate::repository::DbPool;

/// Writes canonical rows into the warehouse tables.
///
/// Inserts replace rows with the same key, and each batch commits as a unit.
#[derive(Clone)]
pub struct WarehouseRepository {
    pool: DbPool,
}

impl WarehouseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn replace_product_info(&self, rows: &[ProductInfo]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO product_info (upc, name, image, thumbnail, short_description, long_description, customer_review_count, customer_review_average, vendor, category_path)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.upc)
            .bind(&row.name)
            .bind(&row.image)
            .bind(&row.thumbnail)
            .bind(&row.short_description)
            .bind(&row.long_description)
            .bind(row.customer_review_count)
            .bind(&row.customer_review_average)
            .bind(&row.vendor)
            .bind(&row.category_path)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(rows.len() as u64)
    }

    pub async fn replace_product_prices(&self, rows: &[ProductPrice]) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO product_prices (ds, upc, regular_price, sale_price, vendor)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(row.ds.format("%Y-%m-%d").to_string())
            .bind(&row.upc)
            .bind(row.regular_price)
            .bind(row.sale_price)
            .bind(&row.vendor)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(rows.len() as u64)
    }

    #[cfg(test)]
    pub async fn count(&self, table: &str) -> Result<i64> {
        let sql = match table {
            "product_info" => "SELECT COUNT(*) FROM product_info",
            "product_prices" => "SELECT COUNT(*) FROM product_prices",
            other => return Err(crate::error::AppError::UnknownTable(other.to_string())),
        };
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

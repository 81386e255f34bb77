use super::nsv;
use crate::error::{AppError, Result};
use crate::models::{OutputCategory, ProductInfo, ProductPrice};
use crate::repository::WarehouseRepository;
use async_trait::async_trait;
use std::path::Path;

/// Loads one row file into a warehouse table, returning the row count.
#[async_trait]
pub trait BulkLoader: Send + Sync {
    async fn load(&self, file: &Path, table: &str) -> Result<u64>;
}

#[derive(Clone)]
pub struct SqliteBulkLoader {
    warehouse: WarehouseRepository,
}

impl SqliteBulkLoader {
    pub fn new(warehouse: WarehouseRepository) -> Self {
        Self { warehouse }
    }
}

#[async_trait]
impl BulkLoader for SqliteBulkLoader {
    async fn load(&self, file: &Path, table: &str) -> Result<u64> {
        if table == OutputCategory::Info.table() {
            let rows: Vec<ProductInfo> = nsv::read_rows(file)?;
            self.warehouse.replace_product_info(&rows).await
        } else if table == OutputCategory::Price.table() {
            let rows: Vec<ProductPrice> = nsv::read_rows(file)?;
            self.warehouse.replace_product_prices(&rows).await
        } else {
            Err(AppError::UnknownTable(table.to_string()))
        }
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Row of the `product_info` warehouse table. Field order is the column order
/// of the NSV files consumed by the bulk loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub upc: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub thumbnail: Option<String>,
    pub short_description: Option<String>,
    pub long_description: Option<String>,
    pub customer_review_count: Option<i64>,
    pub customer_review_average: Option<String>,
    pub vendor: String,
    pub category_path: Option<String>,
}

/// Row of the `product_prices` warehouse table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPrice {
    pub ds: NaiveDate,
    pub upc: String,
    pub regular_price: f64,
    pub sale_price: f64,
    pub vendor: String,
}

/// Output partition of the sanitize phase. Each category has its own
/// subdirectory under `cleaned` and its own destination table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCategory {
    Info,
    Price,
}

impl OutputCategory {
    pub const ALL: [OutputCategory; 2] = [OutputCategory::Info, OutputCategory::Price];

    pub fn dir_name(&self) -> &'static str {
        match self {
            OutputCategory::Info => "product_info",
            OutputCategory::Price => "product_price",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            OutputCategory::Info => "product_info",
            OutputCategory::Price => "product_prices",
        }
    }

    pub fn file_prefix(&self) -> &'static str {
        match self {
            OutputCategory::Info => "info_",
            OutputCategory::Price => "price_",
        }
    }

    pub fn archive_label(&self) -> &'static str {
        match self {
            OutputCategory::Info => "info",
            OutputCategory::Price => "price",
        }
    }
}

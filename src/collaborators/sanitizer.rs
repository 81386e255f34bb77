use super::archive::list_files;
use super::nsv;
use crate::error::Result;
use crate::models::{OutputCategory, PipelineName, ProductInfo, ProductPrice};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

const MISSING_SALE_PRICE: f64 = -0.01;

/// Canonical rows produced from one raw input file.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SanitizedBatch {
    pub info: Vec<ProductInfo>,
    pub price: Vec<ProductPrice>,
    pub skipped: usize,
}

impl SanitizedBatch {
    fn push(&mut self, info: ProductInfo, price: ProductPrice) {
        self.info.push(info);
        self.price.push(price);
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty() && self.price.is_empty()
    }
}

/// Vendor JSON to canonical rows. A parse error rejects the whole file;
/// records without a UPC are counted in `skipped` and dropped.
pub trait RecordSanitizer: Send + Sync {
    fn sanitize(&self, content: &[u8], ds: NaiveDate) -> Result<SanitizedBatch>;
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct SanitizeSummary {
    pub files_parsed: usize,
    pub files_failed: usize,
    pub info_rows: usize,
    pub price_rows: usize,
    pub skipped_records: usize,
}

/// Sanitize every file in `raw_dir`, writing `info_<stem>.nsv` and
/// `price_<stem>.nsv` into the category directories under `cleaned_dir`.
///
/// Files that fail to parse are logged and skipped. I/O errors abort.
pub fn sanitize_dir(
    sanitizer: &dyn RecordSanitizer,
    raw_dir: &Path,
    cleaned_dir: &Path,
    ds: NaiveDate,
) -> Result<SanitizeSummary> {
    let files = list_files(raw_dir)?;
    for category in OutputCategory::ALL {
        fs::create_dir_all(cleaned_dir.join(category.dir_name()))?;
    }

    let mut summary = SanitizeSummary::default();
    for file in files {
        tracing::info!("Parsing data file: {}", file.display());
        let content = fs::read(&file)?;
        let batch = match sanitizer.sanitize(&content, ds) {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!("Parsing data file failed: {}: {}", file.display(), e);
                summary.files_failed += 1;
                continue;
            }
        };
        summary.files_parsed += 1;
        summary.skipped_records += batch.skipped;
        if batch.is_empty() {
            tracing::warn!("The data file contained no items: {}", file.display());
            continue;
        }

        let stem = file
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_default();
        let file_name = |category: OutputCategory| {
            cleaned_dir
                .join(category.dir_name())
                .join(format!("{}{}.nsv", category.file_prefix(), stem))
        };
        nsv::write_rows(&file_name(OutputCategory::Info), &batch.info)?;
        nsv::write_rows(&file_name(OutputCategory::Price), &batch.price)?;
        summary.info_rows += batch.info.len();
        summary.price_rows += batch.price.len();
    }

    Ok(summary)
}

/// BestBuy text: every `\n` and `\r` becomes a space, so CRLF yields two.
fn flatten_bestbuy_text(text: String) -> String {
    text.replace(['\n', '\r'], " ")
}

/// WalMart text: each line break (`\n` or `\r\n`) becomes one space; a lone
/// `\r` is kept.
fn flatten_walmart_text(text: String) -> String {
    text.replace("\r\n", " ").replace('\n', " ")
}

fn value_to_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BestBuyProduct {
    upc: Option<String>,
    name: Option<String>,
    regular_price: Option<f64>,
    sale_price: Option<f64>,
    image: Option<String>,
    thumbnail_image: Option<String>,
    short_description: Option<String>,
    long_description: Option<String>,
    customer_review_count: Option<i64>,
    customer_review_average: Option<Value>,
    category_path: Option<Vec<BestBuyCategory>>,
}

#[derive(Debug, Deserialize)]
struct BestBuyCategory {
    name: Option<String>,
}

/// BestBuy bulk files: a JSON array of products.
#[derive(Debug, Clone, Default)]
pub struct BestBuySanitizer;

impl RecordSanitizer for BestBuySanitizer {
    fn sanitize(&self, content: &[u8], ds: NaiveDate) -> Result<SanitizedBatch> {
        let records: Vec<Value> = serde_json::from_slice(content)?;
        let vendor = PipelineName::BestBuy.as_str().to_string();

        let mut batch = SanitizedBatch::default();
        for record in records {
            let product = match serde_json::from_value::<BestBuyProduct>(record) {
                Ok(product) => product,
                Err(e) => {
                    tracing::debug!("Skipping malformed BestBuy record: {}", e);
                    batch.skipped += 1;
                    continue;
                }
            };
            let Some(upc) = product.upc.filter(|upc| !upc.is_empty()) else {
                batch.skipped += 1;
                continue;
            };

            let sale_price = product.sale_price.unwrap_or(MISSING_SALE_PRICE);
            let category_path = product
                .category_path
                .unwrap_or_default()
                .into_iter()
                .filter_map(|category| category.name)
                .collect::<Vec<_>>()
                .join("/");

            let info = ProductInfo {
                upc: upc.clone(),
                name: product.name.map(flatten_bestbuy_text),
                image: product.image,
                thumbnail: product.thumbnail_image,
                short_description: product.short_description.map(flatten_bestbuy_text),
                long_description: product.long_description.map(flatten_bestbuy_text),
                customer_review_count: product.customer_review_count,
                customer_review_average: product.customer_review_average.and_then(value_to_text),
                vendor: vendor.clone(),
                category_path: (!category_path.is_empty()).then_some(category_path),
            };
            let price = ProductPrice {
                ds,
                upc,
                regular_price: product.regular_price.unwrap_or(sale_price),
                sale_price,
                vendor: vendor.clone(),
            };
            batch.push(info, price);
        }

        Ok(batch)
    }
}

#[derive(Debug, Deserialize)]
struct WalMartPage {
    items: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WalMartItem {
    upc: Option<String>,
    name: Option<String>,
    sale_price: Option<f64>,
    msrp: Option<f64>,
    image: Option<String>,
    thumbnail_image: Option<String>,
    short_description: Option<String>,
    long_description: Option<String>,
    category_path: Option<String>,
}

/// WalMart paginated item pages: `{"items": [...], "nextPage": ...}`.
#[derive(Debug, Clone, Default)]
pub struct WalMartSanitizer;

impl RecordSanitizer for WalMartSanitizer {
    fn sanitize(&self, content: &[u8], ds: NaiveDate) -> Result<SanitizedBatch> {
        let value: Value = serde_json::from_slice(content)?;
        if value.as_object().is_some_and(|object| object.is_empty()) {
            return Ok(SanitizedBatch::default());
        }
        let page: WalMartPage = serde_json::from_value(value)?;
        let vendor = PipelineName::WalMart.as_str().to_string();

        let mut batch = SanitizedBatch::default();
        for record in page.items {
            let item = match serde_json::from_value::<WalMartItem>(record) {
                Ok(item) => item,
                Err(e) => {
                    tracing::debug!("Skipping malformed WalMart record: {}", e);
                    batch.skipped += 1;
                    continue;
                }
            };
            let Some(upc) = item.upc.filter(|upc| !upc.is_empty()) else {
                batch.skipped += 1;
                continue;
            };

            let sale_price = item.sale_price.unwrap_or(MISSING_SALE_PRICE);
            let info = ProductInfo {
                upc: upc.clone(),
                name: item.name.map(flatten_walmart_text),
                image: item.image.map(|image| image.replace('"', "")),
                thumbnail: item.thumbnail_image.map(|image| image.replace('"', "")),
                short_description: item.short_description.map(flatten_walmart_text),
                long_description: item.long_description.map(flatten_walmart_text),
                customer_review_count: Some(0),
                customer_review_average: None,
                vendor: vendor.clone(),
                category_path: item.category_path,
            };
            let price = ProductPrice {
                ds,
                upc,
                regular_price: item.msrp.unwrap_or(sale_price),
                sale_price,
                vendor: vendor.clone(),
            };
            batch.push(info, price);
        }

        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ds() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn walmart_page(total: usize, missing_upc: &[usize]) -> Vec<u8> {
        let items: Vec<Value> = (0..total)
            .map(|i| {
                if missing_upc.contains(&i) {
                    json!({ "name": format!("item {i}"), "salePrice": 9.99 })
                } else {
                    json!({
                        "upc": format!("{:012}", i),
                        "name": format!("item\r\n{i}"),
                        "salePrice": 9.99,
                        "image": "\"http://img/1.jpg\"",
                        "categoryPath": "Electronics/TVs"
                    })
                }
            })
            .collect();
        serde_json::to_vec(&json!({ "items": items, "nextPage": null })).unwrap()
    }

    #[test]
    fn records_missing_upc_are_skipped() {
        let batch = WalMartSanitizer
            .sanitize(&walmart_page(100, &[3, 50, 99]), ds())
            .unwrap();

        assert_eq!(batch.info.len(), 97);
        assert_eq!(batch.price.len(), 97);
        assert_eq!(batch.skipped, 3);
    }

    #[test]
    fn walmart_defaults_and_cleanup() {
        let content = serde_json::to_vec(&json!({
            "items": [
                { "upc": "1", "name": "line\none", "shortDescription": "a\r\nb\rc", "image": "\"a\"" },
                { "upc": "2", "salePrice": 5.0 },
                { "upc": "3", "salePrice": 5.0, "msrp": 7.5 }
            ]
        }))
        .unwrap();

        let batch = WalMartSanitizer.sanitize(&content, ds()).unwrap();

        assert_eq!(batch.info[0].name.as_deref(), Some("line one"));
        assert_eq!(batch.info[0].short_description.as_deref(), Some("a b\rc"));
        assert_eq!(batch.info[0].image.as_deref(), Some("a"));
        assert_eq!(batch.info[0].customer_review_count, Some(0));
        assert_eq!(batch.price[0].sale_price, -0.01);
        assert_eq!(batch.price[0].regular_price, -0.01);
        assert_eq!(batch.price[1].regular_price, 5.0);
        assert_eq!(batch.price[2].regular_price, 7.5);
        assert!(batch.price.iter().all(|price| price.vendor == "WALMART" && price.ds == ds()));
    }

    #[test]
    fn empty_walmart_page_has_no_rows() {
        let batch = WalMartSanitizer.sanitize(b"{}", ds()).unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn bestbuy_products_map_to_canonical_rows() {
        let content = serde_json::to_vec(&json!([
            {
                "upc": "600603",
                "name": "Camera",
                "regularPrice": 199.99,
                "salePrice": 149.99,
                "thumbnailImage": "http://img/t.jpg",
                "longDescription": "multi\r\nline",
                "customerReviewCount": 12,
                "customerReviewAverage": 4.5,
                "categoryPath": [{ "id": "a", "name": "Cameras" }, { "id": "b", "name": "DSLR" }]
            },
            { "name": "no upc" }
        ]))
        .unwrap();

        let batch = BestBuySanitizer.sanitize(&content, ds()).unwrap();

        assert_eq!(batch.skipped, 1);
        let info = &batch.info[0];
        assert_eq!(info.thumbnail.as_deref(), Some("http://img/t.jpg"));
        assert_eq!(info.long_description.as_deref(), Some("multi  line"));
        assert_eq!(info.customer_review_average.as_deref(), Some("4.5"));
        assert_eq!(info.category_path.as_deref(), Some("Cameras/DSLR"));
        assert_eq!(batch.price[0].regular_price, 199.99);
        assert_eq!(batch.price[0].sale_price, 149.99);
    }

    #[test]
    fn unparseable_file_does_not_stop_directory() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("uncleaned");
        let cleaned = dir.path().join("cleaned");
        fs::create_dir_all(&raw).unwrap();
        fs::write(raw.join("a_page_0.json"), walmart_page(100, &[1, 2, 3])).unwrap();
        fs::write(raw.join("a_page_1.json"), b"{ truncated").unwrap();
        fs::write(raw.join("a_page_2.json"), b"{}").unwrap();

        let summary = sanitize_dir(&WalMartSanitizer, &raw, &cleaned, ds()).unwrap();

        assert_eq!(summary.files_parsed, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.info_rows, 97);
        assert_eq!(summary.skipped_records, 3);

        let info_rows: Vec<ProductInfo> =
            nsv::read_rows(&cleaned.join("product_info/info_a_page_0.nsv")).unwrap();
        assert_eq!(info_rows.len(), 97);
        assert_eq!(info_rows[0].name.as_deref(), Some("item 0"));
        assert!(cleaned.join("product_price/price_a_page_0.nsv").is_file());
        assert!(!cleaned.join("product_info/info_a_page_2.nsv").exists());
    }
}

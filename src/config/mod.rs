use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const DEFAULT_BUCKET: &str = "catalog-data";
const DEFAULT_WALMART_MAX_PAGES: u32 = 400;
const DEFAULT_WALMART_CATEGORIES: [&str; 11] = [
    "4044_90548",
    "3944_1229722",
    "3944_1156273_1156275",
    "3944_542371",
    "3944_3951",
    "3944_1060825_447913",
    "3944_1229723_5635313",
    "3944_133277",
    "3944_3951_1230331",
    "3944_1228606",
    "3944_1078524",
];

/// Selects `conf/config.<profile>.json`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    #[default]
    Development,
    Production,
}

impl Profile {
    pub fn as_str(&self) -> &'static str {
        match self {
            Profile::Development => "development",
            Profile::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestBuyConfig {
    pub api_base: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for BestBuyConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.bestbuy.com/v1/products.json.zip?apiKey=".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalMartConfig {
    pub api_base: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub categories: Vec<String>,
    pub max_pages: u32,
}

impl Default for WalMartConfig {
    fn default() -> Self {
        Self {
            api_base: "http://api.walmartlabs.com".to_string(),
            api_key: None,
            categories: DEFAULT_WALMART_CATEGORIES
                .iter()
                .map(|category| category.to_string())
                .collect(),
            max_pages: DEFAULT_WALMART_MAX_PAGES,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub profile: Profile,
    pub database_url: String,
    pub work_root: PathBuf,
    pub bucket: String,
    /// S3-compatible endpoint. Uploads go to `object_store_root` when unset.
    pub object_store_endpoint: Option<String>,
    pub object_store_root: PathBuf,
    pub notify_webhook_url: Option<String>,
    pub upload_raw_payloads: bool,
    pub bestbuy: BestBuyConfig,
    pub walmart: WalMartConfig,
}

impl Default for Config {
    fn default() -> Self {
        let database_url = crate::paths::data_dir()
            .map(|dir| format!("sqlite:{}", dir.join("catalog_loader.db").display()))
            .unwrap_or_else(|_| "sqlite:catalog_loader.db".to_string());
        let work_root = crate::paths::work_dir().unwrap_or_else(|_| PathBuf::from("work_dir"));
        let object_store_root = crate::paths::object_store_dir()
            .unwrap_or_else(|_| PathBuf::from("object_store"));
        Self {
            profile: Profile::default(),
            database_url,
            work_root,
            bucket: DEFAULT_BUCKET.to_string(),
            object_store_endpoint: None,
            object_store_root,
            notify_webhook_url: None,
            upload_raw_payloads: false,
            bestbuy: BestBuyConfig::default(),
            walmart: WalMartConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env(profile: Profile) -> Result<Self> {
        let mut config = Self {
            profile,
            ..Self::default()
        };

        if let Some(file_config) = Self::from_conf_file(profile)? {
            config.apply_file(file_config);
        }

        if let Ok(db_url) = std::env::var("DATABASE_URL") {
            config.database_url = db_url;
        }

        if let Ok(work_root) = std::env::var("CATALOG_WORK_ROOT") {
            config.work_root = PathBuf::from(work_root);
        }

        if let Ok(api_key) = std::env::var("BESTBUY_API_KEY") {
            config.bestbuy.api_key = Some(api_key);
        }

        if let Ok(api_key) = std::env::var("WALMART_API_KEY") {
            config.walmart.api_key = Some(api_key);
        }

        if let Ok(url) = std::env::var("NOTIFY_WEBHOOK_URL") {
            config.notify_webhook_url = Some(url);
        }

        config.drop_blank_keys();
        config.normalize_database_url()?;
        Ok(config)
    }

    fn from_conf_file(profile: Profile) -> Result<Option<FileConfig>> {
        let path = crate::paths::conf_dir()?.join(format!("config.{}.json", profile.as_str()));
        if !path.is_file() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let file_config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        Ok(Some(file_config))
    }

    fn apply_file(&mut self, file_config: FileConfig) {
        if let Some(database_url) = file_config.database_url {
            self.database_url = database_url;
        }
        if let Some(work_root) = file_config.work_root {
            self.work_root = PathBuf::from(work_root);
        }
        if let Some(bucket) = file_config.bucket {
            self.bucket = bucket;
        }
        if let Some(endpoint) = file_config.object_store_endpoint {
            self.object_store_endpoint = Some(endpoint);
        }
        if let Some(root) = file_config.object_store_root {
            self.object_store_root = PathBuf::from(root);
        }
        if let Some(url) = file_config.notify_webhook_url {
            self.notify_webhook_url = Some(url);
        }
        if let Some(upload) = file_config.upload_raw_payloads {
            self.upload_raw_payloads = upload;
        }
        if let Some(bestbuy) = file_config.bestbuy {
            if let Some(api_base) = bestbuy.api_base {
                self.bestbuy.api_base = api_base;
            }
            if let Some(api_key) = bestbuy.api_key {
                self.bestbuy.api_key = Some(api_key);
            }
        }
        if let Some(walmart) = file_config.walmart {
            if let Some(api_base) = walmart.api_base {
                self.walmart.api_base = api_base;
            }
            if let Some(api_key) = walmart.api_key {
                self.walmart.api_key = Some(api_key);
            }
            if let Some(categories) = walmart.categories {
                self.walmart.categories = categories;
            }
            if let Some(max_pages) = walmart.max_pages {
                self.walmart.max_pages = max_pages;
            }
        }
    }

    fn drop_blank_keys(&mut self) {
        for key in [&mut self.bestbuy.api_key, &mut self.walmart.api_key] {
            if key.as_deref().is_some_and(|value| value.trim().is_empty()) {
                *key = None;
            }
        }
        if self
            .notify_webhook_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            self.notify_webhook_url = None;
        }
    }

    fn normalize_database_url(&mut self) -> Result<()> {
        let Some(path_str) = self.database_url.strip_prefix("sqlite:") else {
            return Ok(());
        };

        let path = Path::new(path_str);
        if path.is_absolute() {
            return Ok(());
        }

        if path
            .components()
            .any(|component| matches!(component, std::path::Component::ParentDir))
        {
            anyhow::bail!("SQLite database path cannot contain '..'");
        }

        let root = crate::paths::install_root()?;
        let absolute = root.join(path);
        self.database_url = format!("sqlite:{}", absolute.display());
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileConfig {
    database_url: Option<String>,
    work_root: Option<String>,
    bucket: Option<String>,
    object_store_endpoint: Option<String>,
    object_store_root: Option<String>,
    notify_webhook_url: Option<String>,
    upload_raw_payloads: Option<bool>,
    bestbuy: Option<FileBestBuyConfig>,
    walmart: Option<FileWalMartConfig>,
}

#[derive(Debug, Default, Deserialize)]
struct FileBestBuyConfig {
    api_base: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FileWalMartConfig {
    api_base: Option<String>,
    api_key: Option<String>,
    categories: Option<Vec<String>>,
    max_pages: Option<u32>,
}

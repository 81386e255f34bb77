pub mod bestbuy;
pub mod phases;
pub mod registry;
pub mod walmart;
pub mod workspace;

pub use bestbuy::BestBuyPipeline;
pub use phases::{PhaseOutcome, run_sequence};
pub use registry::PipelineRegistry;
pub use walmart::WalMartPipeline;
pub use workspace::WorkingDirs;

use crate::collaborators::archive::{list_files, zip_dir};
use crate::collaborators::sanitizer::sanitize_dir;
use crate::collaborators::{BulkLoader, Fetcher, ObjectStore, RecordSanitizer};
use crate::error::{AppError, Result};
use crate::models::{OutputCategory, PipelineName};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::sync::Arc;

/// A vendor's binding of the five phases. Each operation receives the
/// directory it reads from and reports success as a plain boolean; errors are
/// logged by the implementation.
#[async_trait]
pub trait VendorPipeline: Send + Sync {
    fn name(&self) -> PipelineName;

    fn dirs(&self) -> &WorkingDirs;

    async fn data_retrieval(&self, base: &Path) -> bool;

    async fn pre_process(&self, base: &Path) -> bool;

    async fn sanitize(&self, uncleaned: &Path) -> bool;

    async fn s3_upload(&self, cleaned: &Path) -> bool;

    async fn db_insertion(&self, cleaned: &Path) -> bool;
}

/// Collaborators shared by every vendor pipeline.
#[derive(Clone)]
pub struct PipelineContext {
    pub fetcher: Arc<dyn Fetcher>,
    pub object_store: Arc<dyn ObjectStore>,
    pub bulk_loader: Arc<dyn BulkLoader>,
    pub bucket: String,
    pub upload_raw_payloads: bool,
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub(crate) fn succeeded(phase: &str, result: Result<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("{} failed: {}", phase, e);
            false
        }
    }
}

/// Sanitize `uncleaned` into `cleaned`. Fails only when no file could be parsed.
pub(crate) fn sanitize_into(
    sanitizer: &dyn RecordSanitizer,
    uncleaned: &Path,
    cleaned: &Path,
) -> Result<()> {
    let summary = sanitize_dir(sanitizer, uncleaned, cleaned, today())?;
    tracing::info!(
        files_parsed = summary.files_parsed,
        files_failed = summary.files_failed,
        info_rows = summary.info_rows,
        price_rows = summary.price_rows,
        skipped_records = summary.skipped_records,
        "Sanitization summary"
    );
    if summary.files_parsed == 0 {
        return Err(AppError::EmptyDirectory(uncleaned.to_path_buf()));
    }
    Ok(())
}

/// Zip each category directory of `cleaned` into `base` and upload it under
/// `product-data/<vendor>/parsed-data/<date>/`.
pub(crate) async fn upload_categories(
    ctx: &PipelineContext,
    pipeline: PipelineName,
    base: &Path,
    cleaned: &Path,
) -> Result<()> {
    let date = today();
    for category in OutputCategory::ALL {
        let source = cleaned.join(category.dir_name());
        let zip_name = format!("{}_{}-parsed-data.zip", date, category.archive_label());
        let zip_path = base.join(&zip_name);
        let entries = zip_dir(&source, &zip_path)?;
        tracing::info!("Compressed {} files into {}", entries, zip_path.display());

        let key = format!(
            "product-data/{}/parsed-data/{}/{}",
            pipeline.slug(),
            date,
            zip_name
        );
        ctx.object_store.upload(&ctx.bucket, &key, &zip_path).await?;
    }
    Ok(())
}

/// Best-effort upload of a raw payload. Failures are only logged.
pub(crate) async fn upload_raw(ctx: &PipelineContext, key: &str, file: &Path) {
    if let Err(e) = ctx.object_store.upload(&ctx.bucket, key, file).await {
        tracing::warn!("Uploading raw payload {} failed: {}", file.display(), e);
    }
}

/// Load every row file of each category directory into its table.
pub(crate) async fn load_categories(loader: &dyn BulkLoader, cleaned: &Path) -> Result<()> {
    for category in OutputCategory::ALL {
        let dir = cleaned.join(category.dir_name());
        let files = list_files(&dir)?;
        if files.is_empty() {
            return Err(AppError::EmptyDirectory(dir));
        }
        let mut rows = 0;
        for file in files {
            tracing::info!("Loading {} into {}", file.display(), category.table());
            rows += loader.load(&file, category.table()).await?;
        }
        tracing::info!("Loaded {} rows into {}", rows, category.table());
    }
    Ok(())
}

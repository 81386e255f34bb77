use super::{
    PipelineContext, VendorPipeline, WorkingDirs, load_categories, sanitize_into, succeeded, today,
    upload_categories, upload_raw,
};
use crate::collaborators::BestBuySanitizer;
use crate::collaborators::archive::{extract_zip, list_files};
use crate::error::{AppError, Result};
use crate::models::PipelineName;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// BestBuy publishes its whole catalog as one zipped bulk file of JSON arrays.
pub struct BestBuyPipeline {
    dirs: WorkingDirs,
    ctx: PipelineContext,
    api_base: String,
    api_key: String,
    sanitizer: BestBuySanitizer,
}

impl BestBuyPipeline {
    pub fn new(
        dirs: WorkingDirs,
        ctx: PipelineContext,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            dirs,
            ctx,
            api_base: api_base.into(),
            api_key: api_key.into(),
            sanitizer: BestBuySanitizer,
        }
    }

    async fn retrieve(&self, base: &Path) -> Result<()> {
        let file_name = format!("{}_products_BestBuy.json.zip", today());
        let path = base.join(&file_name);
        let url = format!("{}{}", self.api_base, self.api_key);

        tracing::info!("Downloading BestBuy bulk products to {}", path.display());
        let response = self.ctx.fetcher.get(&url).await?;
        if !response.is_success() {
            // The request URL carries the API key.
            return Err(AppError::HttpStatus {
                url: self.api_base.clone(),
                status: response.status,
            });
        }
        let written = response.write_to_file(&path, "BestBuy").await?;
        tracing::info!("Downloaded {} bytes", written);

        if self.ctx.upload_raw_payloads {
            let key = format!("product-data/{}/bulk-data/{}", self.name().slug(), file_name);
            upload_raw(&self.ctx, &key, &path).await;
        }
        Ok(())
    }

    fn extract(&self, base: &Path) -> Result<()> {
        let archives: Vec<PathBuf> = list_files(base)?
            .into_iter()
            .filter(|path| path.extension().is_some_and(|ext| ext == "zip"))
            .collect();
        if archives.is_empty() {
            return Err(AppError::EmptyDirectory(base.to_path_buf()));
        }

        for archive in archives {
            let extracted = extract_zip(&archive, &self.dirs.uncleaned)?;
            tracing::info!("Extracted {} files from {}", extracted.len(), archive.display());
            if let Err(e) = std::fs::remove_file(&archive) {
                tracing::warn!("Deleting archive {} failed: {}", archive.display(), e);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl VendorPipeline for BestBuyPipeline {
    fn name(&self) -> PipelineName {
        PipelineName::BestBuy
    }

    fn dirs(&self) -> &WorkingDirs {
        &self.dirs
    }

    async fn data_retrieval(&self, base: &Path) -> bool {
        succeeded("BestBuy data retrieval", self.retrieve(base).await)
    }

    async fn pre_process(&self, base: &Path) -> bool {
        succeeded("BestBuy preprocess", self.extract(base))
    }

    async fn sanitize(&self, uncleaned: &Path) -> bool {
        succeeded(
            "BestBuy sanitization",
            sanitize_into(&self.sanitizer, uncleaned, &self.dirs.cleaned),
        )
    }

    async fn s3_upload(&self, cleaned: &Path) -> bool {
        succeeded(
            "BestBuy upload",
            upload_categories(&self.ctx, self.name(), &self.dirs.base, cleaned).await,
        )
    }

    async fn db_insertion(&self, cleaned: &Path) -> bool {
        succeeded(
            "BestBuy database insertion",
            load_categories(self.ctx.bulk_loader.as_ref(), cleaned).await,
        )
    }
}

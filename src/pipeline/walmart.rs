use super::{
    PipelineContext, VendorPipeline, WorkingDirs, load_categories, sanitize_into, succeeded, today,
    upload_categories, upload_raw,
};
use crate::collaborators::WalMartSanitizer;
use crate::collaborators::archive::zip_dir;
use crate::error::{AppError, Result};
use crate::models::PipelineName;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;

const GATEWAY_TIMEOUT: u16 = 504;

#[derive(Debug, Deserialize)]
struct PageCursor {
    #[serde(rename = "nextPage")]
    next_page: Option<String>,
}

/// WalMart exposes a paginated items API per category; pages land directly in
/// `uncleaned`, so there is nothing to preprocess.
pub struct WalMartPipeline {
    dirs: WorkingDirs,
    ctx: PipelineContext,
    api_base: String,
    api_key: String,
    categories: Vec<String>,
    max_pages: u32,
    sanitizer: WalMartSanitizer,
}

impl WalMartPipeline {
    pub fn new(
        dirs: WorkingDirs,
        ctx: PipelineContext,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        categories: Vec<String>,
        max_pages: u32,
    ) -> Self {
        Self {
            dirs,
            ctx,
            api_base: api_base.into(),
            api_key: api_key.into(),
            categories,
            max_pages,
            sanitizer: WalMartSanitizer,
        }
    }

    fn first_page(&self, category: &str) -> String {
        format!(
            "/v1/paginated/items?apiKey={}&format=json&category={}",
            self.api_key, category
        )
    }

    async fn retrieve(&self, base: &Path) -> Result<()> {
        tokio::fs::create_dir_all(&self.dirs.uncleaned).await?;
        for category in &self.categories {
            let pages = self.retrieve_category(category).await?;
            tracing::info!("Category {}: {} pages downloaded", category, pages);
        }

        if self.ctx.upload_raw_payloads {
            let zip_name = format!("{}_uncleaned-data.zip", today());
            let zip_path = base.join(&zip_name);
            match zip_dir(&self.dirs.uncleaned, &zip_path) {
                Ok(_) => {
                    let key = format!("product-data/{}/uncleaned-data/{}", self.name().slug(), zip_name);
                    upload_raw(&self.ctx, &key, &zip_path).await;
                }
                Err(e) => tracing::warn!("Compressing uncleaned data failed: {}", e),
            }
        }
        Ok(())
    }

    /// Follow `nextPage` links for one category, spending at most `max_pages`
    /// requests. Returns the number of pages written.
    async fn retrieve_category(&self, category: &str) -> Result<usize> {
        let base_url = self.api_base.trim_end_matches('/');
        let mut next = Some(self.first_page(category));
        let mut pages = 0;

        for _ in 0..self.max_pages {
            let Some(suffix) = next.take() else {
                break;
            };
            let response = self.ctx.fetcher.get(&format!("{}{}", base_url, suffix)).await?;
            if response.status == GATEWAY_TIMEOUT {
                tracing::warn!("Request timed out for category {}, retrying", category);
                next = Some(suffix);
                continue;
            }

            if !response.is_success() {
                return Err(AppError::HttpStatus {
                    url: format!("{} (category {})", base_url, category),
                    status: response.status,
                });
            }
            let body = response.bytes().await?;
            let path = self
                .dirs
                .uncleaned
                .join(format!("{}_page_{}.json", category, pages));
            tracing::info!("Writing page to {}", path.display());
            tokio::fs::write(&path, &body).await?;
            pages += 1;

            match serde_json::from_slice::<PageCursor>(&body) {
                Ok(cursor) => next = cursor.next_page.filter(|page| !page.is_empty()),
                Err(e) => {
                    tracing::warn!("Reading next page of category {} failed: {}", category, e);
                }
            }
        }

        if next.is_some() {
            tracing::warn!("Category {} stopped at the page limit", category);
        }
        Ok(pages)
    }
}

#[async_trait]
impl VendorPipeline for WalMartPipeline {
    fn name(&self) -> PipelineName {
        PipelineName::WalMart
    }

    fn dirs(&self) -> &WorkingDirs {
        &self.dirs
    }

    async fn data_retrieval(&self, base: &Path) -> bool {
        succeeded("WalMart data retrieval", self.retrieve(base).await)
    }

    async fn pre_process(&self, _base: &Path) -> bool {
        true
    }

    async fn sanitize(&self, uncleaned: &Path) -> bool {
        succeeded(
            "WalMart sanitization",
            sanitize_into(&self.sanitizer, uncleaned, &self.dirs.cleaned),
        )
    }

    async fn s3_upload(&self, cleaned: &Path) -> bool {
        succeeded(
            "WalMart upload",
            upload_categories(&self.ctx, self.name(), &self.dirs.base, cleaned).await,
        )
    }

    async fn db_insertion(&self, cleaned: &Path) -> bool {
        succeeded(
            "WalMart database insertion",
            load_categories(self.ctx.bulk_loader.as_ref(), cleaned).await,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{StaticFetcher, test_context_with};
    use std::sync::Arc;

    fn pipeline(root: &Path, fetcher: Arc<StaticFetcher>, max_pages: u32) -> WalMartPipeline {
        let (ctx, _) = test_context_with(root, fetcher);
        let dirs = WorkingDirs::new(&root.join("work"), PipelineName::WalMart);
        dirs.prepare().unwrap();
        WalMartPipeline::new(
            dirs,
            ctx,
            "http://walmart.test/",
            "key",
            vec!["3944".to_string()],
            max_pages,
        )
    }

    #[tokio::test]
    async fn follows_next_page_and_retries_timeouts() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(StaticFetcher::sequence(vec![
            (200, br#"{"items":[],"nextPage":"/v1/paginated/items?maxId=2"}"#.to_vec()),
            (504, Vec::new()),
            (200, br#"{"items":[]}"#.to_vec()),
        ]));
        let pipeline = pipeline(root.path(), fetcher.clone(), 10);

        assert!(pipeline.data_retrieval(&pipeline.dirs().base).await);

        let requests = fetcher.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(
            requests[0],
            "http://walmart.test/v1/paginated/items?apiKey=key&format=json&category=3944"
        );
        assert_eq!(requests[1], "http://walmart.test/v1/paginated/items?maxId=2");
        assert_eq!(requests[2], requests[1]);
        assert!(pipeline.dirs().uncleaned.join("3944_page_0.json").is_file());
        assert!(pipeline.dirs().uncleaned.join("3944_page_1.json").is_file());
    }

    #[tokio::test]
    async fn page_budget_bounds_requests() {
        let root = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(StaticFetcher::status(504));
        let pipeline = pipeline(root.path(), fetcher.clone(), 3);

        assert!(pipeline.data_retrieval(&pipeline.dirs().base).await);
        assert_eq!(fetcher.requests().len(), 3);
    }

    #[tokio::test]
    async fn server_error_fails_retrieval() {
        let root = tempfile::tempdir().unwrap();
        let pipeline = pipeline(root.path(), Arc::new(StaticFetcher::status(500)), 3);

        assert!(!pipeline.data_retrieval(&pipeline.dirs().base).await);
    }

    #[tokio::test]
    async fn preprocess_is_a_noop() {
        let root = tempfile::tempdir().unwrap();
        let pipeline = pipeline(root.path(), Arc::new(StaticFetcher::status(200)), 1);
        assert!(pipeline.pre_process(&pipeline.dirs().base).await);
    }
}

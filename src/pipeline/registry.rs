use super::{BestBuyPipeline, PipelineContext, VendorPipeline, WalMartPipeline, WorkingDirs};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{PipelineName, PipelineRunRequest};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Vendor pipelines keyed by name.
#[derive(Default, Clone)]
pub struct PipelineRegistry {
    pipelines: BTreeMap<PipelineName, Arc<dyn VendorPipeline>>,
}

impl PipelineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every vendor that has an API key configured.
    pub fn from_config(config: &Config, ctx: PipelineContext) -> Self {
        let mut registry = Self::new();

        if let Some(api_key) = config.bestbuy.api_key.as_deref() {
            registry.register(Arc::new(BestBuyPipeline::new(
                WorkingDirs::new(&config.work_root, PipelineName::BestBuy),
                ctx.clone(),
                config.bestbuy.api_base.clone(),
                api_key,
            )));
        }

        if let Some(api_key) = config.walmart.api_key.as_deref() {
            registry.register(Arc::new(WalMartPipeline::new(
                WorkingDirs::new(&config.work_root, PipelineName::WalMart),
                ctx,
                config.walmart.api_base.clone(),
                api_key,
                config.walmart.categories.clone(),
                config.walmart.max_pages,
            )));
        }

        registry
    }

    pub fn register(&mut self, pipeline: Arc<dyn VendorPipeline>) {
        self.pipelines.insert(pipeline.name(), pipeline);
    }

    pub fn get(&self, name: PipelineName) -> Option<Arc<dyn VendorPipeline>> {
        self.pipelines.get(&name).cloned()
    }

    /// Every pipeline the request actually runs must be registered.
    pub fn ensure_available(&self, request: &PipelineRunRequest) -> Result<()> {
        let missing: Vec<&str> = request
            .active()
            .filter(|name| !self.pipelines.contains_key(name))
            .map(|name| name.as_str())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(AppError::Config(format!(
            "No API key configured for requested pipelines: {}",
            missing.join(", ")
        )))
    }
}

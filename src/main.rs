mod collaborators;
mod config;
mod error;
mod models;
mod paths;
mod pipeline;
mod repository;
mod services;
#[cfg(test)]
mod test_support;

use crate::collaborators::{
    HttpFetcher, HttpObjectStore, LocalObjectStore, LogNotifier, Notifier, ObjectStore,
    SqliteBulkLoader, WebhookNotifier,
};
use crate::config::{Config, Profile};
use crate::models::{Phase, PipelineName, PipelineRunRequest};
use crate::pipeline::{PipelineContext, PipelineRegistry};
use crate::repository::{FailureStateRepository, WarehouseRepository, establish_connection};
use crate::services::{PipelineRunner, RetryDriver};
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn parse_phase(value: &str) -> Result<Phase, String> {
    value.parse().map_err(|e: error::AppError| e.to_string())
}

/// Retrieve vendor product catalogs and load them into the warehouse.
#[derive(Debug, Parser)]
#[command(name = "catalog_loader", version, about)]
struct Cli {
    /// Configuration profile to load from conf/config.<profile>.json
    #[arg(long, value_enum, default_value_t = Profile::Development)]
    profile: Profile,

    /// Phase to start the BestBuy pipeline at
    #[arg(long, value_parser = parse_phase, default_value = "NONE")]
    bestbuy: Phase,

    /// Phase to start the WalMart pipeline at
    #[arg(long, value_parser = parse_phase, default_value = "NONE")]
    walmart: Phase,

    /// Retries allowed after the first attempt
    #[arg(long, env = "CATALOG_MAX_RETRIES", default_value_t = 0)]
    max_retries: u32,
}

impl Cli {
    fn run_request(&self) -> PipelineRunRequest {
        PipelineRunRequest::new()
            .with(PipelineName::BestBuy, self.bestbuy)
            .with(PipelineName::WalMart, self.walmart)
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = Config::from_env(cli.profile)?;
    tracing::info!(
        profile = config.profile.as_str(),
        work_root = %config.work_root.display(),
        bucket = %config.bucket,
        "Starting catalog_loader"
    );

    let request = cli.run_request();
    if request.active().next().is_none() {
        tracing::info!("No pipelines requested");
        return Ok(true);
    }

    if let Some(path) = config.database_url.strip_prefix("sqlite:") {
        let path = std::path::Path::new(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_pool = establish_connection(&config.database_url).await?;
    tracing::info!("Database connected: {}", config.database_url);

    let client = reqwest::Client::new();
    let object_store: Arc<dyn ObjectStore> = match config.object_store_endpoint.as_deref() {
        Some(endpoint) => Arc::new(HttpObjectStore::new(client.clone(), endpoint)),
        None => Arc::new(LocalObjectStore::new(config.object_store_root.clone())),
    };
    let notifier: Arc<dyn Notifier> = match config.notify_webhook_url.as_deref() {
        Some(url) => Arc::new(WebhookNotifier::new(client.clone(), url)),
        None => Arc::new(LogNotifier),
    };

    let ctx = PipelineContext {
        fetcher: Arc::new(HttpFetcher::new(client)),
        object_store,
        bulk_loader: Arc::new(SqliteBulkLoader::new(WarehouseRepository::new(
            db_pool.clone(),
        ))),
        bucket: config.bucket.clone(),
        upload_raw_payloads: config.upload_raw_payloads,
    };
    let registry = PipelineRegistry::from_config(&config, ctx);
    registry.ensure_available(&request)?;

    let runner = PipelineRunner::new(FailureStateRepository::new(db_pool.clone()), notifier);
    let driver = RetryDriver::new(runner, registry, cli.max_retries);
    let report = driver.run(request).await;
    db_pool.close().await;

    tracing::info!(
        attempts = report.attempts,
        outstanding = report.outstanding.len(),
        "Finished"
    );
    Ok(report.succeeded())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "catalog_loader=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

//! Fakes and fixtures shared by unit tests.

use crate::collaborators::fetcher::ResponseBody;
use crate::collaborators::{BulkLoader, FetchResponse, Fetcher, LocalObjectStore, Notifier};
use crate::error::Result;
use crate::models::{Phase, PipelineName, ProductInfo, ProductPrice};
use crate::pipeline::{PipelineContext, VendorPipeline, WorkingDirs};
use crate::repository::{DbPool, establish_connection};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::VecDeque;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

pub async fn temp_pool() -> (TempDir, DbPool) {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}", dir.path().join("test.db").display());
    let pool = establish_connection(&url).await.unwrap();
    (dir, pool)
}

struct MemoryBody(VecDeque<Vec<u8>>);

#[async_trait]
impl ResponseBody for MemoryBody {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.0.pop_front())
    }
}

pub fn memory_response(status: u16, chunks: Vec<Vec<u8>>) -> FetchResponse {
    let total: usize = chunks.iter().map(Vec::len).sum();
    FetchResponse {
        status,
        content_length: Some(total as u64),
        body: Box::new(MemoryBody(chunks.into())),
    }
}

pub fn sample_info(upc: &str) -> ProductInfo {
    ProductInfo {
        upc: upc.to_string(),
        name: Some(format!("Product {upc}")),
        image: Some("http://img/full.jpg".to_string()),
        thumbnail: None,
        short_description: Some("short".to_string()),
        long_description: None,
        customer_review_count: Some(3),
        customer_review_average: Some("4.0".to_string()),
        vendor: "BESTBUY".to_string(),
        category_path: Some("Electronics/TV".to_string()),
    }
}

pub fn sample_price(upc: &str) -> ProductPrice {
    ProductPrice {
        ds: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        upc: upc.to_string(),
        regular_price: 19.99,
        sale_price: 14.99,
        vendor: "BESTBUY".to_string(),
    }
}

pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Replies from a script of `(status, body)` pairs, then repeats `fallback`.
pub struct StaticFetcher {
    script: Mutex<VecDeque<(u16, Vec<u8>)>>,
    fallback: (u16, Vec<u8>),
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn ok(body: Vec<u8>) -> Self {
        Self::sequence(Vec::new()).with_fallback(200, body)
    }

    pub fn status(status: u16) -> Self {
        Self::sequence(Vec::new()).with_fallback(status, Vec::new())
    }

    pub fn sequence(script: Vec<(u16, Vec<u8>)>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: (404, Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn with_fallback(mut self, status: u16, body: Vec<u8>) -> Self {
        self.fallback = (status, body);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        self.requests.lock().unwrap().push(url.to_string());
        let (status, body) = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());
        Ok(memory_response(status, vec![body]))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    successes: Mutex<Vec<PipelineName>>,
    failures: Mutex<Vec<(PipelineName, Phase)>>,
}

impl RecordingNotifier {
    pub fn successes(&self) -> Vec<PipelineName> {
        self.successes.lock().unwrap().clone()
    }

    pub fn failures(&self) -> Vec<(PipelineName, Phase)> {
        self.failures.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify_success(&self, pipeline: PipelineName, _elapsed: Duration) {
        self.successes.lock().unwrap().push(pipeline);
    }

    async fn notify_failure(&self, pipeline: PipelineName, phase: Phase) {
        self.failures.lock().unwrap().push((pipeline, phase));
    }
}

#[derive(Default)]
pub struct RecordingBulkLoader {
    loads: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingBulkLoader {
    pub fn loads(&self) -> Vec<(PathBuf, String)> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl BulkLoader for RecordingBulkLoader {
    async fn load(&self, file: &Path, table: &str) -> Result<u64> {
        self.loads
            .lock()
            .unwrap()
            .push((file.to_path_buf(), table.to_string()));
        Ok(1)
    }
}

/// Context backed by a local object store under `<root>/store`.
pub fn test_context_with(root: &Path, fetcher: Arc<dyn Fetcher>) -> (PipelineContext, PathBuf) {
    let store_root = root.join("store");
    let ctx = PipelineContext {
        fetcher,
        object_store: Arc::new(LocalObjectStore::new(store_root.clone())),
        bulk_loader: Arc::new(RecordingBulkLoader::default()),
        bucket: "test-bucket".to_string(),
        upload_raw_payloads: false,
    };
    (ctx, store_root)
}

pub fn test_context(root: &Path) -> (PipelineContext, PathBuf) {
    test_context_with(root, Arc::new(StaticFetcher::status(404)))
}

/// Pipeline whose phases only record that they ran. It fails at `fail_at`,
/// for every attempt or for the first `fail_times` attempts.
pub struct ScriptedPipeline {
    name: PipelineName,
    dirs: WorkingDirs,
    fail_at: Option<Phase>,
    remaining_failures: Mutex<Option<u32>>,
    invoked: Mutex<Vec<Phase>>,
}

impl ScriptedPipeline {
    pub fn new(work_root: &Path, name: PipelineName) -> Self {
        Self {
            name,
            dirs: WorkingDirs::new(work_root, name),
            fail_at: None,
            remaining_failures: Mutex::new(None),
            invoked: Mutex::new(Vec::new()),
        }
    }

    pub fn failing_at(mut self, phase: Phase) -> Self {
        self.fail_at = Some(phase);
        self
    }

    pub fn fail_times(self, times: u32) -> Self {
        *self.remaining_failures.lock().unwrap() = Some(times);
        self
    }

    pub fn invoked(&self) -> Vec<Phase> {
        self.invoked.lock().unwrap().clone()
    }

    fn step(&self, phase: Phase) -> bool {
        self.invoked.lock().unwrap().push(phase);
        if self.fail_at != Some(phase) {
            return true;
        }
        let mut remaining = self.remaining_failures.lock().unwrap();
        match *remaining {
            None => false,
            Some(0) => true,
            Some(ref mut count) => {
                *count -= 1;
                false
            }
        }
    }
}

#[async_trait]
impl VendorPipeline for ScriptedPipeline {
    fn name(&self) -> PipelineName {
        self.name
    }

    fn dirs(&self) -> &WorkingDirs {
        &self.dirs
    }

    async fn data_retrieval(&self, _base: &Path) -> bool {
        self.step(Phase::DataRetrieval)
    }

    async fn pre_process(&self, _base: &Path) -> bool {
        self.step(Phase::PreProcess)
    }

    async fn sanitize(&self, _uncleaned: &Path) -> bool {
        self.step(Phase::Sanitization)
    }

    async fn s3_upload(&self, _cleaned: &Path) -> bool {
        self.step(Phase::S3Upload)
    }

    async fn db_insertion(&self, _cleaned: &Path) -> bool {
        self.step(Phase::DbInsertion)
    }
}

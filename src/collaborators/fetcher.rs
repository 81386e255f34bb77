use super::progress::{ByteCounter, PROGRESS_INTERVAL, spawn_progress_observer};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Incrementally readable response body.
#[async_trait]
pub trait ResponseBody: Send {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;
}

pub struct FetchResponse {
    pub status: u16,
    pub content_length: Option<u64>,
    pub body: Box<dyn ResponseBody>,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Stream the body to `path`, reporting progress when the length is known.
    /// Returns the number of bytes written.
    pub async fn write_to_file(mut self, path: &Path, label: &str) -> Result<u64> {
        let mut file = tokio::fs::File::create(path).await?;
        let counter = ByteCounter::new();
        let observer = match self.content_length {
            Some(total) if total > 0 => {
                tracing::info!("{} file size: {}MiB", label, total / 1_048_576);
                Some(spawn_progress_observer(
                    label.to_string(),
                    counter.clone(),
                    total,
                    PROGRESS_INTERVAL,
                ))
            }
            _ => None,
        };

        let result = async {
            while let Some(chunk) = self.body.next_chunk().await? {
                file.write_all(&chunk).await?;
                counter.add(chunk.len() as u64);
            }
            file.flush().await?;
            Ok::<_, AppError>(counter.get())
        }
        .await;

        if let Some(observer) = observer {
            observer.abort();
        }
        result
    }

    pub async fn bytes(mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        while let Some(chunk) = self.body.next_chunk().await? {
            buffer.extend_from_slice(&chunk);
        }
        Ok(buffer)
    }
}

/// HTTP GET of vendor bulk data.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str) -> Result<FetchResponse>;
}

#[derive(Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

struct ReqwestBody(reqwest::Response);

#[async_trait]
impl ResponseBody for ReqwestBody {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let chunk = self.0.chunk().await?;
        Ok(chunk.map(|bytes| bytes.to_vec()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Result<FetchResponse> {
        let response = self.client.get(url).send().await?;
        Ok(FetchResponse {
            status: response.status().as_u16(),
            content_length: response.content_length(),
            body: Box::new(ReqwestBody(response)),
        })
    }
}

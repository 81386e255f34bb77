use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Byte counter shared between a download and its progress observer.
#[derive(Debug, Clone, Default)]
pub struct ByteCounter(Arc<AtomicU64>);

impl ByteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, bytes: u64) {
        self.0.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Log download progress every `interval` until `counter` reaches `total`.
///
/// The observer is detached from the download: it holds no lock and the
/// download result never depends on it.
pub fn spawn_progress_observer(
    label: String,
    counter: ByteCounter,
    total: u64,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let read = counter.get();
            if read >= total {
                break;
            }
            tracing::info!(
                "{} progress: {:.2}%",
                label,
                100.0 * read as f64 / total as f64
            );
            tokio::time::sleep(interval).await;
        }
    })
}

pub mod archive;
pub mod bulk_loader;
pub mod fetcher;
pub mod notifier;
pub mod nsv;
pub mod object_store;
pub mod progress;
pub mod sanitizer;

pub use bulk_loader::{BulkLoader, SqliteBulkLoader};
pub use fetcher::{FetchResponse, Fetcher, HttpFetcher};
pub use notifier::{LogNotifier, Notifier, WebhookNotifier};
pub use object_store::{HttpObjectStore, LocalObjectStore, ObjectStore};
pub use sanitizer::{BestBuySanitizer, RecordSanitizer, WalMartSanitizer};

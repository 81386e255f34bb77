use crate::models::{Phase, PipelineName};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

const SUBJECT_PREFIX: &str = "[CatalogLoader]";

/// Success/failure notifications for operators. Delivery problems are logged by
/// the implementation and never surface to the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_success(&self, pipeline: PipelineName, elapsed: Duration);
    async fn notify_failure(&self, pipeline: PipelineName, phase: Phase);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn success(pipeline: PipelineName, elapsed: Duration) -> Self {
        Self {
            subject: format!("{} Data Pipeline Success", SUBJECT_PREFIX),
            body: format!(
                "Data pipeline success.\nPipeline: {}\nExecution Time: {}",
                pipeline,
                format_elapsed(elapsed)
            ),
        }
    }

    pub fn failure(pipeline: PipelineName, phase: Phase) -> Self {
        Self {
            subject: format!("{} Data Pipeline Failure", SUBJECT_PREFIX),
            body: format!(
                "Failure in data pipeline.\nPipeline: {}\nPhase: {}",
                pipeline, phase
            ),
        }
    }
}

/// Render a duration as `"<m>min, <s>s, <ms>ms"`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    let minutes = millis / 60_000;
    let seconds = (millis % 60_000) / 1000;
    let milliseconds = millis % 1000;
    format!("{}min, {}s, {}ms", minutes, seconds, milliseconds)
}

/// Writes notifications to the log only.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_success(&self, pipeline: PipelineName, elapsed: Duration) {
        let notification = Notification::success(pipeline, elapsed);
        tracing::info!("{}: {}", notification.subject, notification.body);
    }

    async fn notify_failure(&self, pipeline: PipelineName, phase: Phase) {
        let notification = Notification::failure(pipeline, phase);
        tracing::error!("{}: {}", notification.subject, notification.body);
    }
}

/// POSTs `{"subject", "body"}` JSON to a webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    async fn send(&self, notification: Notification) {
        let result = self
            .client
            .post(&self.url)
            .json(&notification)
            .send()
            .await
            .and_then(|response| response.error_for_status());
        if let Err(e) = result {
            tracing::error!("Sending notification failed: {}", e);
        }
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_success(&self, pipeline: PipelineName, elapsed: Duration) {
        self.send(Notification::success(pipeline, elapsed)).await;
    }

    async fn notify_failure(&self, pipeline: PipelineName, phase: Phase) {
        self.send(Notification::failure(pipeline, phase)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_elapsed_time() {
        assert_eq!(format_elapsed(Duration::from_millis(125_042)), "2min, 5s, 42ms");
        assert_eq!(format_elapsed(Duration::ZERO), "0min, 0s, 0ms");
    }

    #[test]
    fn failure_body_names_pipeline_and_phase() {
        let notification = Notification::failure(PipelineName::BestBuy, Phase::DataRetrieval);
        assert!(notification.subject.ends_with("Data Pipeline Failure"));
        assert_eq!(
            notification.body,
            "Failure in data pipeline.\nPipeline: BESTBUY\nPhase: DATA_RETRIEVAL"
        );
    }
}
